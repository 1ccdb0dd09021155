//! Unit tests for authentication module

use actix_web::test::TestRequest;
use actix_web::FromRequest;
use uuid::Uuid;

use crate::auth::jwt::{generate_access_token, get_access_token_expiry, validate_token};
use crate::auth::middleware::validate_request_token;
use crate::auth::model::{AuthenticatedUser, Claims, Role};

#[test]
fn test_generate_and_validate_access_token() {
    let user_id = Uuid::new_v4().to_string();

    let token = generate_access_token(&user_id, "mariama", Role::Teacher)
        .expect("Failed to generate access token");
    let claims = validate_token(&token).expect("Failed to validate token");

    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.username, "mariama");
    assert_eq!(claims.role, "teacher");
    assert_eq!(claims.token_type, "access");
    assert_eq!((claims.exp - claims.iat) as i64, get_access_token_expiry());
}

#[test]
fn test_invalid_token_returns_error() {
    assert!(validate_token("invalid.token.here").is_err());
}

#[test]
fn test_role_from_claim() {
    assert_eq!(Role::from_claim("Student"), Role::Student);
    assert_eq!(Role::from_claim(" guardian "), Role::Guardian);
    assert_eq!(Role::from_claim("teacher"), Role::Teacher);
    assert_eq!(Role::from_claim("principal"), Role::Staff);
    assert!(Role::Student.is_student());
    assert!(!Role::Staff.is_student());
}

#[test]
fn test_claims_to_authenticated_user() {
    let id = Uuid::new_v4();
    let claims = Claims {
        sub: id.to_string(),
        username: "fatu".to_string(),
        role: "guardian".to_string(),
        exp: 12345,
        iat: 12340,
        token_type: "access".to_string(),
    };

    let user = AuthenticatedUser::try_from(claims).expect("valid claims");
    assert_eq!(user.id, id);
    assert_eq!(user.role, Role::Guardian);
}

#[test]
fn test_claims_with_non_uuid_subject_rejected() {
    let claims = Claims {
        sub: "setup-mode".to_string(),
        username: "admin".to_string(),
        role: "teacher".to_string(),
        exp: 12345,
        iat: 12340,
        token_type: "access".to_string(),
    };
    assert!(AuthenticatedUser::try_from(claims).is_err());
}

#[test]
fn test_missing_header_rejected() {
    let req = TestRequest::default().to_http_request();
    assert!(validate_request_token(&req).is_err());
}

#[actix_web::test]
async fn test_extractor_accepts_bearer_token() {
    let id = Uuid::new_v4();
    let token = generate_access_token(&id.to_string(), "sia", Role::Student).unwrap();
    let (req, mut payload) = TestRequest::default()
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_http_parts();

    let user = AuthenticatedUser::from_request(&req, &mut payload)
        .await
        .expect("token should be accepted");
    assert_eq!(user.id, id);
    assert_eq!(user.role, Role::Student);
}
