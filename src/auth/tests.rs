use super::{AuthError, AuthValidator, JwtValidator, bearer_token};
use crate::config::AuthSettings;

fn validator(secret: &str) -> JwtValidator {
    JwtValidator::new(&AuthSettings {
        jwt_secret: secret.to_string(),
        token_ttl_secs: 3600,
    })
}

#[test]
fn test_issued_token_validates() {
    let jwt = validator("secret");
    let token = jwt.issue(7, "alice").unwrap();

    assert_eq!(jwt.validate(&token).unwrap(), 7);
    let claims = jwt.claims(&token).unwrap();
    assert_eq!(claims.username, "alice");
}

#[test]
fn test_wrong_secret_is_rejected() {
    let token = validator("secret").issue(7, "alice").unwrap();
    assert!(matches!(
        validator("other").validate(&token),
        Err(AuthError::Invalid(_))
    ));
}

#[test]
fn test_expired_token_is_rejected() {
    let jwt = validator("secret");
    let an_hour_ago = (chrono::Utc::now().timestamp() - 3600) as usize;
    let token = jwt.issue_with_expiry(7, "alice", an_hour_ago).unwrap();
    assert!(matches!(jwt.validate(&token), Err(AuthError::Invalid(_))));
}

#[test]
fn test_huge_ttl_saturates_instead_of_overflowing() {
    let jwt = JwtValidator::new(&AuthSettings {
        jwt_secret: "secret".to_string(),
        token_ttl_secs: u64::MAX,
    });
    let token = jwt.issue(7, "alice").unwrap();

    assert_eq!(jwt.claims(&token).unwrap().exp, usize::MAX);
    assert_eq!(jwt.validate(&token).unwrap(), 7);
}

#[test]
fn test_garbage_token_is_rejected() {
    assert!(validator("secret").validate("invalid.token.here").is_err());
}

#[test]
fn test_bearer_token_parsing() {
    assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
    assert_eq!(bearer_token(Some("bearer  abc ")).unwrap(), "abc");
    assert!(matches!(bearer_token(None), Err(AuthError::MissingCredential)));
    assert!(matches!(
        bearer_token(Some("Basic abc")),
        Err(AuthError::MalformedHeader)
    ));
    assert!(matches!(
        bearer_token(Some("Bearer")),
        Err(AuthError::MalformedHeader)
    ));
}
