//! Role seeding against an in-memory store

use super::TestRoleRepository;
use teamjoin_core::domain::{ADMINISTRATOR, INSTRUCTOR, STUDENT, SUPER_ADMINISTRATOR, TEACHING_ASSISTANT};
use teamjoin_core::repository::RoleRepository;
use teamjoin_core::service::RoleService;
use std::sync::Arc;

#[tokio::test]
async fn test_seed_creates_canonical_chain() {
    let repo = Arc::new(TestRoleRepository::new());
    let service = RoleService::new(repo.clone());

    let hierarchy = service.seed_hierarchy().await.unwrap();

    assert_eq!(repo.count().await, 5);
    assert_eq!(hierarchy.root(), Some(SUPER_ADMINISTRATOR));
    assert!(hierarchy.is_at_least(ADMINISTRATOR, INSTRUCTOR));
    assert!(hierarchy.is_at_least(TEACHING_ASSISTANT, STUDENT));
    assert!(!hierarchy.is_at_least(STUDENT, TEACHING_ASSISTANT));
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let repo = Arc::new(TestRoleRepository::new());
    let service = RoleService::new(repo.clone());

    let first = service.seed_hierarchy().await.unwrap();
    let second = service.seed_hierarchy().await.unwrap();

    assert_eq!(repo.count().await, 5);
    assert_eq!(first.id_of(STUDENT), second.id_of(STUDENT));
}

#[tokio::test]
async fn test_seed_keeps_existing_rows() {
    let repo = Arc::new(TestRoleRepository::new());
    let root = repo.create(SUPER_ADMINISTRATOR, None).await.unwrap();
    let service = RoleService::new(repo.clone());

    let hierarchy = service.seed_hierarchy().await.unwrap();

    assert_eq!(hierarchy.id_of(SUPER_ADMINISTRATOR), Some(root.id));
    assert_eq!(repo.count().await, 5);
}

#[tokio::test]
async fn test_ensure_role_with_unknown_parent_fails() {
    let repo = Arc::new(TestRoleRepository::new());
    let service = RoleService::new(repo.clone());

    let result = service.ensure_role("grader", Some("nobody")).await;

    assert!(result.is_err());
    assert_eq!(repo.count().await, 0);
}
