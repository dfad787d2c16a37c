use crate::error::{ApiError, ApiResult};
use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Teacher,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
        }
    }

    pub fn parse(s: &str) -> ApiResult<Role> {
        match s {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            other => Err(ApiError::validation(format!(
                "role must be admin or teacher, got {}",
                other
            ))),
        }
    }
}

/// The authenticated caller, threaded explicitly into every operation that
/// needs attribution or a role check. There is no ambient current-user state.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub name: String,
    pub role: Role,
}

impl Caller {
    /// Both roles may record attendance; the distinction only matters for the
    /// admin surface.
    pub fn can_record_attendance(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Teacher)
    }

    pub fn require_admin(&self) -> ApiResult<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("admin role required".to_string()))
        }
    }
}

/// Resolve an opaque bearer token against the sessions table. Token issuance
/// (login) is not this daemon's job; unknown tokens are simply rejected.
pub fn resolve_token(conn: &Connection, token: &str) -> ApiResult<Caller> {
    let row = conn
        .query_row(
            "SELECT u.id, u.name, u.role
             FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token = ?",
            [token],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    let Some((user_id, name, role)) = row else {
        return Err(ApiError::Unauthenticated("unknown session token".to_string()));
    };
    Ok(Caller {
        user_id,
        name,
        role: Role::parse(&role)?,
    })
}

pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips() {
        assert_eq!(Role::parse("admin").unwrap(), Role::Admin);
        assert_eq!(Role::parse("teacher").unwrap(), Role::Teacher);
        assert!(Role::parse("principal").is_err());
    }

    #[test]
    fn hash_is_stable_hex() {
        let h = hash_password("secret123");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_password("secret123"));
        assert_ne!(h, hash_password("secret124"));
    }
}
