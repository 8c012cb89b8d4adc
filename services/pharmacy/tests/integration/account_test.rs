use rxdesk_domain::id::UserId;
use rxdesk_domain::user::UserRole;
use rxdesk_pharmacy::domain::types::{EMAIL_TAKEN, RoleDetails, self_registered};
use rxdesk_pharmacy::error::PharmacyServiceError;
use rxdesk_pharmacy::usecase::account::{
    AuthenticateUseCase, CreateUserInput, CreateUserUseCase, GetUserUseCase, INVALID_CREDENTIALS,
    USER_NOT_FOUND,
};
use rxdesk_pharmacy::usecase::bootstrap::{SEED_ADMIN_FIRST_NAME, SeedAdminUseCase};
use rxdesk_pharmacy::usecase::staff::SetUserActiveUseCase;
use rxdesk_testing::auth::test_token_keys;

use crate::helpers::{MockUserRepo, account_input};

async fn register(repo: &MockUserRepo, email: &str, role: UserRole) -> UserId {
    CreateUserUseCase { repo: repo.clone() }
        .execute(CreateUserInput {
            account: account_input(email),
            role,
        })
        .await
        .unwrap()
        .account
        .id
}

// ── CreateUserUseCase ────────────────────────────────────────────────────────

#[tokio::test]
async fn should_register_patient_with_empty_details() {
    let repo = MockUserRepo::new();
    let record = CreateUserUseCase { repo: repo.clone() }
        .execute(CreateUserInput {
            account: account_input("meera@example.com"),
            role: UserRole::Patient,
        })
        .await
        .unwrap();

    assert_eq!(record.account.role, UserRole::Patient);
    assert!(record.account.is_active);
    assert!(matches!(record.details, RoleDetails::Patient(ref p) if p.address.is_none()));

    let users = repo.users_handle();
    let stored = users.lock().unwrap();
    assert_ne!(stored[0].1, "secret123", "password must be stored hashed");
    assert!(stored[0].1.starts_with("$argon2"));
}

#[tokio::test]
async fn should_fill_placeholder_details_for_self_registered_doctor() {
    let repo = MockUserRepo::new();
    let record = CreateUserUseCase { repo: repo.clone() }
        .execute(CreateUserInput {
            account: account_input("doc@example.com"),
            role: UserRole::Doctor,
        })
        .await
        .unwrap();

    let RoleDetails::Doctor(doctor) = record.details else {
        panic!("expected doctor details, got {:?}", record.details);
    };
    assert_eq!(doctor.specialization, self_registered::DOCTOR_SPECIALIZATION);
    assert!(doctor.license_number.starts_with(self_registered::DOCTOR_LICENSE_PREFIX));
    assert_eq!(doctor.consultation_fee, self_registered::DOCTOR_CONSULTATION_FEE);
    assert!(doctor.is_available);
}

#[tokio::test]
async fn should_give_self_registered_pharmacists_distinct_employee_ids() {
    let repo = MockUserRepo::new();
    let a = register(&repo, "a@example.com", UserRole::Pharmacist).await;
    let b = register(&repo, "b@example.com", UserRole::Pharmacist).await;

    let users = repo.users_handle();
    let stored = users.lock().unwrap();
    let employee_id = |id: UserId| {
        stored
            .iter()
            .find_map(|(r, _)| match &r.details {
                RoleDetails::Staff(s) if r.account.id == id => Some(s.employee_id.clone()),
                _ => None,
            })
            .unwrap()
    };
    assert_ne!(employee_id(a), employee_id(b));
    assert!(employee_id(a).starts_with(self_registered::EMPLOYEE_ID_PREFIX));
}

#[tokio::test]
async fn should_reject_duplicate_email_on_register() {
    let repo = MockUserRepo::new();
    register(&repo, "dup@example.com", UserRole::Patient).await;

    let result = CreateUserUseCase { repo: repo.clone() }
        .execute(CreateUserInput {
            account: account_input("dup@example.com"),
            role: UserRole::Doctor,
        })
        .await;

    assert!(
        matches!(result, Err(PharmacyServiceError::Conflict(ref m)) if m == EMAIL_TAKEN),
        "expected Conflict, got {result:?}"
    );
    assert_eq!(repo.count(), 1);
}

#[tokio::test]
async fn should_check_cap_for_self_registered_partner() {
    let repo = MockUserRepo::new();
    for i in 0..10 {
        register(&repo, &format!("p{i}@example.com"), UserRole::Partner).await;
    }

    let result = CreateUserUseCase { repo: repo.clone() }
        .execute(CreateUserInput {
            account: account_input("p10@example.com"),
            role: UserRole::Partner,
        })
        .await;

    assert!(
        matches!(result, Err(PharmacyServiceError::Conflict(ref m)) if m.contains("Current total: 100%")),
        "expected Conflict, got {result:?}"
    );
    assert_eq!(repo.count(), 10);
}

// ── AuthenticateUseCase ──────────────────────────────────────────────────────

#[tokio::test]
async fn should_issue_token_for_valid_credentials() {
    let repo = MockUserRepo::new();
    let id = register(&repo, "login@example.com", UserRole::Doctor).await;

    let session = AuthenticateUseCase {
        repo: repo.clone(),
        keys: test_token_keys(),
    }
    .execute("login@example.com", "secret123")
    .await
    .unwrap();

    assert_eq!(session.account.id, id);
    let info = test_token_keys().verify(&session.token.token).unwrap();
    assert_eq!(info.user_id, id);
    assert_eq!(info.role, UserRole::Doctor);
    assert_eq!(info.email, "login@example.com");
}

#[tokio::test]
async fn should_fail_identically_for_unknown_email_wrong_password_and_inactive_user() {
    let repo = MockUserRepo::new();
    let id = register(&repo, "who@example.com", UserRole::Patient).await;
    let usecase = AuthenticateUseCase {
        repo: repo.clone(),
        keys: test_token_keys(),
    };

    let unknown = usecase.execute("nobody@example.com", "secret123").await;
    let wrong = usecase.execute("who@example.com", "not-the-password").await;
    SetUserActiveUseCase { repo: repo.clone() }
        .execute(id, false)
        .await
        .unwrap();
    let inactive = usecase.execute("who@example.com", "secret123").await;

    for result in [unknown, wrong, inactive] {
        assert!(
            matches!(result, Err(PharmacyServiceError::Unauthorized(ref m)) if m == INVALID_CREDENTIALS),
            "expected Unauthorized, got {result:?}"
        );
    }
}

// ── GetUserUseCase ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_return_active_account() {
    let repo = MockUserRepo::new();
    let id = register(&repo, "me@example.com", UserRole::Pharmacist).await;

    let account = GetUserUseCase { repo: repo.clone() }
        .execute(id)
        .await
        .unwrap();
    assert_eq!(account.email, "me@example.com");
    assert_eq!(account.role, UserRole::Pharmacist);
}

#[tokio::test]
async fn should_treat_deactivated_account_as_missing() {
    let repo = MockUserRepo::new();
    let id = register(&repo, "gone@example.com", UserRole::Patient).await;
    SetUserActiveUseCase { repo: repo.clone() }
        .execute(id, false)
        .await
        .unwrap();

    let result = GetUserUseCase { repo: repo.clone() }.execute(id).await;
    assert!(
        matches!(result, Err(PharmacyServiceError::NotFound(ref m)) if m == USER_NOT_FOUND),
        "expected NotFound, got {result:?}"
    );
}

// ── SeedAdminUseCase ─────────────────────────────────────────────────────────

#[tokio::test]
async fn should_seed_admin_once() {
    let repo = MockUserRepo::new();
    let usecase = SeedAdminUseCase { repo: repo.clone() };

    assert!(usecase.execute("root@pharmacy.local", "changeme").await.unwrap());
    assert!(!usecase.execute("root@pharmacy.local", "changeme").await.unwrap());
    assert_eq!(repo.count(), 1);

    let users = repo.users_handle();
    let stored = users.lock().unwrap();
    assert_eq!(stored[0].0.account.role, UserRole::Admin);
    assert_eq!(stored[0].0.account.first_name, SEED_ADMIN_FIRST_NAME);
    assert_eq!(stored[0].0.details, RoleDetails::Admin);
}
