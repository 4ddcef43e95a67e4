//! Dashboard aggregation tests, driven by store state directly since the
//! aggregator is a pure read over whatever is committed.

mod common;

use common::World;
use coursematch_domain::{
    Application, ApplicationStatus, ApplicationStore, AssignmentId, DomainError, Enrollment,
    EnrollmentStore, Project, ProjectStatus, ProjectStore, Role, UserId,
};

async fn enroll(world: &World, count: usize) -> Vec<UserId> {
    let mut students = Vec::new();
    for _ in 0..count {
        let id = UserId::new();
        world
            .enrollments
            .enroll(Enrollment {
                course_id: world.course_id,
                user_id: id,
            })
            .await
            .unwrap();
        students.push(id);
    }
    students
}

async fn project_with_status(world: &World, owner: UserId, status: ProjectStatus) -> Project {
    let mut project = Project::new(
        world.assignment_id,
        "Seeded",
        "",
        3,
        owner,
        Role::Student,
    );
    project.status = status;
    world.projects.insert(project.clone()).await.unwrap();
    project
}

#[tokio::test]
async fn assigned_students_are_the_distinct_owners_and_approved_applicants() {
    let world = World::new().await;
    let students = enroll(&world, 10).await;

    // One student owns an approved project.
    let project = project_with_status(&world, students[0], ProjectStatus::Approved).await;

    // Three others hold approved applications.
    for student in &students[1..4] {
        let mut application = Application::new(project.id, *student, "");
        application.status = ApplicationStatus::Approved;
        world.applications.insert(application).await.unwrap();
    }

    let details = world.dashboard.details(world.assignment_id).await.unwrap();
    assert_eq!(details.total_students, 10);
    assert_eq!(details.assigned_students, 4);
    assert_eq!(details.unassigned_students, 6);
    assert_eq!(details.unassigned_sample.len(), 6);
    for student in &students[..4] {
        assert!(!details.unassigned_sample.contains(student));
    }
}

#[tokio::test]
async fn review_queue_counts_pending_and_revised_with_a_capped_sample() {
    let world = World::new().await;

    for _ in 0..4 {
        project_with_status(&world, UserId::new(), ProjectStatus::Pending).await;
    }
    for _ in 0..3 {
        project_with_status(&world, UserId::new(), ProjectStatus::Revised).await;
    }
    for _ in 0..2 {
        project_with_status(&world, UserId::new(), ProjectStatus::NeedsRevision).await;
    }
    project_with_status(&world, UserId::new(), ProjectStatus::Published).await;

    let details = world.dashboard.details(world.assignment_id).await.unwrap();
    assert_eq!(details.review_queue_projects, 7);
    assert_eq!(details.review_queue.len(), 5);
    assert_eq!(details.needs_revision_projects, 2);
    for summary in &details.review_queue {
        assert!(matches!(
            summary.status,
            ProjectStatus::Pending | ProjectStatus::Revised
        ));
    }
}

#[tokio::test]
async fn pending_applications_are_counted_across_the_assignment() {
    let world = World::new().await;
    let project_a = project_with_status(&world, UserId::new(), ProjectStatus::Published).await;
    let project_b = project_with_status(&world, UserId::new(), ProjectStatus::Published).await;

    for project in [&project_a, &project_b] {
        world
            .applications
            .insert(Application::new(project.id, UserId::new(), ""))
            .await
            .unwrap();
    }
    let mut rejected = Application::new(project_a.id, UserId::new(), "");
    rejected.status = ApplicationStatus::Rejected;
    world.applications.insert(rejected).await.unwrap();

    let details = world.dashboard.details(world.assignment_id).await.unwrap();
    assert_eq!(details.pending_applications, 2);
}

#[tokio::test]
async fn the_unassigned_listing_is_capped_at_ten() {
    let world = World::new().await;
    enroll(&world, 15).await;

    let details = world.dashboard.details(world.assignment_id).await.unwrap();
    assert_eq!(details.total_students, 15);
    assert_eq!(details.unassigned_students, 15);
    assert_eq!(details.unassigned_sample.len(), 10);
}

#[tokio::test]
async fn an_empty_assignment_yields_all_zeroes() {
    let world = World::new().await;

    let details = world.dashboard.details(world.assignment_id).await.unwrap();
    assert_eq!(details.total_students, 0);
    assert_eq!(details.assigned_students, 0);
    assert_eq!(details.review_queue_projects, 0);
    assert_eq!(details.pending_applications, 0);
    assert!(details.review_queue.is_empty());
    assert!(details.unassigned_sample.is_empty());
}

#[tokio::test]
async fn unknown_assignments_read_as_not_found() {
    let world = World::new().await;

    let err = world
        .dashboard
        .details(AssignmentId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::EntityNotFound { .. }));
}
