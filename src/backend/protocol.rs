//! Wire shapes of the console backend, decoded explicitly at the boundary.
//!
//! The backend speaks `{status, ...}` envelopes whose payload shape varies
//! by operation. Anything that does not match an expected variant is treated
//! as a rejection, never guessed at.

use serde_json::Value;

use crate::error::SessionError;
use crate::identity::{Identity, Role};

/// Decoded answer of the login-status operation.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginCheck {
    /// The backend vouches for a live session.
    Active(StatusIdentity),
    /// The backend explicitly reported "not logged in".
    NotLoggedIn,
}

/// Identity fields present on a login-status response.
///
/// `userName` and the account type are optional on this operation; the
/// validator fills gaps from the previously persisted identity.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusIdentity {
    pub user_id: i64,
    pub user_name: Option<String>,
    pub role: Option<Role>,
}

impl StatusIdentity {
    /// Build a full identity, filling omitted fields from a known one.
    pub fn into_identity(self, known: Option<&Identity>) -> Identity {
        Identity {
            user_name: self
                .user_name
                .or_else(|| known.map(|identity| identity.user_name.clone()))
                .unwrap_or_default(),
            role: self
                .role
                .or_else(|| known.map(|identity| identity.role))
                .unwrap_or(Role::User),
            user_id: Some(self.user_id),
        }
    }
}

/// Decoded answer of the login operation.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// Credentials accepted; the backend issued this identity.
    Accepted(Identity),
    /// Credentials rejected with a human-readable reason.
    Rejected { message: String },
}

/// Decode a login-status response body.
///
/// `status == 1` with a well-formed `data` payload means logged in; any other
/// numeric status means logged out; everything else is a rejection.
pub fn decode_login_status(body: &Value) -> Result<LoginCheck, SessionError> {
    let Some(status) = body.get("status").and_then(Value::as_i64) else {
        return Err(SessionError::BackendRejected(
            "login-status response carries no status field".to_string(),
        ));
    };

    if status != 1 {
        return Ok(LoginCheck::NotLoggedIn);
    }

    let Some(data) = body.get("data").filter(|data| data.is_object()) else {
        return Err(SessionError::BackendRejected(
            "login-status response reports active but carries no data".to_string(),
        ));
    };

    let Some(user_id) = data.get("userId").and_then(Value::as_i64) else {
        return Err(SessionError::BackendRejected(
            "login-status data carries no userId".to_string(),
        ));
    };

    Ok(LoginCheck::Active(StatusIdentity {
        user_id,
        user_name: data
            .get("userName")
            .and_then(Value::as_str)
            .map(str::to_string),
        role: data
            .get("type")
            .and_then(Value::as_i64)
            .map(Role::from_account_type),
    }))
}

/// Decode a login response body.
///
/// `status == 1` requires a well-formed `user` payload; any other numeric
/// status is a rejection carrying the backend's message.
pub fn decode_login(body: &Value) -> Result<LoginOutcome, SessionError> {
    let Some(status) = body.get("status").and_then(Value::as_i64) else {
        return Err(SessionError::BackendRejected(
            "login response carries no status field".to_string(),
        ));
    };

    if status != 1 {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("invalid credentials")
            .to_string();
        return Ok(LoginOutcome::Rejected { message });
    }

    let Some(user) = body.get("user").filter(|user| user.is_object()) else {
        return Err(SessionError::BackendRejected(
            "login response reports success but carries no user".to_string(),
        ));
    };

    let Some(user_name) = user.get("userName").and_then(Value::as_str) else {
        return Err(SessionError::BackendRejected(
            "login user carries no userName".to_string(),
        ));
    };

    let role = user
        .get("type")
        .and_then(Value::as_i64)
        .map(Role::from_account_type)
        .unwrap_or(Role::User);

    Ok(LoginOutcome::Accepted(Identity {
        user_name: user_name.to_string(),
        role,
        user_id: user.get("userId").and_then(Value::as_i64),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_active_status() {
        let body = json!({"status": 1, "data": {"userId": 7, "userName": "a@x.com", "type": 0}});
        let check = decode_login_status(&body).unwrap();
        assert_eq!(
            check,
            LoginCheck::Active(StatusIdentity {
                user_id: 7,
                user_name: Some("a@x.com".to_string()),
                role: Some(Role::Admin),
            })
        );
    }

    #[test]
    fn test_decode_status_with_sparse_data() {
        let body = json!({"status": 1, "data": {"userId": 7}});
        let LoginCheck::Active(status) = decode_login_status(&body).unwrap() else {
            panic!("expected active session");
        };
        assert_eq!(status.user_id, 7);
        assert!(status.user_name.is_none());
        assert!(status.role.is_none());
    }

    #[test]
    fn test_decode_logged_out_status() {
        let body = json!({"status": 0});
        assert_eq!(decode_login_status(&body).unwrap(), LoginCheck::NotLoggedIn);

        let body = json!({"status": -3, "message": "session expired"});
        assert_eq!(decode_login_status(&body).unwrap(), LoginCheck::NotLoggedIn);
    }

    #[test]
    fn test_malformed_status_is_rejected() {
        for body in [
            json!([1, 2, 3]),
            json!({"ok": true}),
            json!({"status": "yes"}),
            json!({"status": 1}),
            json!({"status": 1, "data": {"userName": "a@x.com"}}),
        ] {
            let err = decode_login_status(&body).unwrap_err();
            assert!(matches!(err, SessionError::BackendRejected(_)), "{body}");
        }
    }

    #[test]
    fn test_decode_accepted_login() {
        let body = json!({"status": 1, "user": {"userName": "a@x.com", "type": 0}});
        let LoginOutcome::Accepted(identity) = decode_login(&body).unwrap() else {
            panic!("expected accepted login");
        };
        assert_eq!(identity.user_name, "a@x.com");
        assert_eq!(identity.role, Role::Admin);
        assert!(identity.user_id.is_none());
    }

    #[test]
    fn test_decode_rejected_login() {
        let body = json!({"status": 0, "message": "wrong password"});
        assert_eq!(
            decode_login(&body).unwrap(),
            LoginOutcome::Rejected {
                message: "wrong password".to_string()
            }
        );

        // Message is optional on rejections.
        let body = json!({"status": 0});
        let LoginOutcome::Rejected { message } = decode_login(&body).unwrap() else {
            panic!("expected rejection");
        };
        assert_eq!(message, "invalid credentials");
    }

    #[test]
    fn test_malformed_login_is_rejected() {
        for body in [json!({"status": 1}), json!({"status": 1, "user": {"type": 0}})] {
            let err = decode_login(&body).unwrap_err();
            assert!(matches!(err, SessionError::BackendRejected(_)), "{body}");
        }
    }

    #[test]
    fn test_status_identity_merges_known_fields() {
        let known = Identity {
            user_name: "a@x.com".to_string(),
            role: Role::Admin,
            user_id: Some(7),
        };

        let sparse = StatusIdentity {
            user_id: 7,
            user_name: None,
            role: None,
        };
        let merged = sparse.into_identity(Some(&known));
        assert_eq!(merged.user_name, "a@x.com");
        assert_eq!(merged.role, Role::Admin);
        assert_eq!(merged.user_id, Some(7));

        // Fresh fields win over known ones.
        let fresh = StatusIdentity {
            user_id: 8,
            user_name: Some("b@x.com".to_string()),
            role: Some(Role::User),
        };
        let merged = fresh.into_identity(Some(&known));
        assert_eq!(merged.user_name, "b@x.com");
        assert_eq!(merged.role, Role::User);
        assert_eq!(merged.user_id, Some(8));
    }
}
