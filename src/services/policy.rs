// src/services/policy.rs
//
// Pure authorization checks. The middlewares in `web::mw_*` only load data and
// call into these, so every rule here is testable without a request.
use crate::{
    error::{AppError, AppResult},
    models::{
        account::{Account, Role},
        club::{Club, GroupPermission, GroupRole},
    },
};

/// Staff routes: faculty plus the implicit admin.
pub const STAFF_ROLES: &[Role] = &[Role::Faculty];

/// Role check: the account's role must be listed; `admin` always passes.
pub fn check_role(account: &Account, allowed: &[Role]) -> AppResult<()> {
    if account.role == Role::Admin || allowed.contains(&account.role) {
        return Ok(());
    }
    let names: Vec<&str> = allowed.iter().map(|r| r.as_str()).collect();
    Err(AppError::forbidden(
        format!("Access denied. Required roles: {}", names.join(", ")),
        "INSUFFICIENT_PERMISSIONS",
    ))
}

/// Owner references a resource may carry, checked in this order.
#[derive(Debug, Default, Clone, Copy)]
pub struct OwnerFields<'a> {
    pub user: Option<&'a str>,
    pub creator: Option<&'a str>,
    pub author: Option<&'a str>,
}

pub trait Owned {
    fn owner_fields(&self) -> OwnerFields<'_>;

    fn is_owned_by(&self, account_id: &str) -> bool {
        let fields = self.owner_fields();
        [fields.user, fields.creator, fields.author]
            .into_iter()
            .flatten()
            .any(|owner| owner == account_id)
    }
}

/// Ownership check over an already loaded resource.
pub fn check_ownership<D: Owned>(account: &Account, resource: Option<&D>) -> AppResult<()> {
    let Some(resource) = resource else {
        return Err(AppError::not_found("Resource not found", "RESOURCE_NOT_FOUND"));
    };
    if resource.is_owned_by(&account.id) || account.role == Role::Admin {
        return Ok(());
    }
    Err(AppError::forbidden(
        "Access denied. You can only access your own resources.",
        "ACCESS_DENIED",
    ))
}

/// Group-permission check. Returns the caller's standing inside the club.
///
/// The `admin` level is satisfied by the club's own admin or a platform admin;
/// the lower levels follow the club's role precedence only.
pub fn check_group_permission(
    account: &Account,
    club: &Club,
    required: GroupPermission,
) -> AppResult<GroupRole> {
    let role = club.role_of(&account.id);
    let allowed = match required {
        GroupPermission::Admin => role == GroupRole::Admin || account.role == Role::Admin,
        _ => role.meets(required),
    };
    if allowed {
        Ok(role)
    } else {
        Err(AppError::forbidden(
            format!("Access denied. {} permission required.", required.as_str()),
            "CLUB_PERMISSION_DENIED",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        account::sample_account,
        club::{sample_club, ModeratorTitle},
    };
    use chrono::Utc;
    use rand::{seq::SliceRandom, Rng};

    struct Post {
        user: Option<String>,
        creator: Option<String>,
        author: Option<String>,
    }

    impl Owned for Post {
        fn owner_fields(&self) -> OwnerFields<'_> {
            OwnerFields {
                user: self.user.as_deref(),
                creator: self.creator.as_deref(),
                author: self.author.as_deref(),
            }
        }
    }

    fn random_owner(rng: &mut impl Rng, ids: &[&str]) -> Option<String> {
        if rng.gen_bool(0.3) {
            return None;
        }
        ids.choose(rng).map(|id| id.to_string())
    }

    #[test]
    fn admin_passes_every_role_check() {
        let admin = sample_account("root", Role::Admin);
        assert!(check_role(&admin, &[]).is_ok());
        assert!(check_role(&admin, &[Role::Student]).is_ok());

        let student = sample_account("s1", Role::Student);
        assert!(check_role(&student, &[Role::Student]).is_ok());
        let err = check_role(&student, STAFF_ROLES).unwrap_err();
        assert!(matches!(err, AppError::Forbidden { code: "INSUFFICIENT_PERMISSIONS", .. }));
    }

    #[test]
    fn ownership_accepts_any_owner_field_and_admin() {
        let mut rng = rand::thread_rng();
        let ids = ["me", "someone", "other"];
        let admin = sample_account("root", Role::Admin);

        for _ in 0..200 {
            let post = Post {
                user: random_owner(&mut rng, &ids),
                creator: random_owner(&mut rng, &ids),
                author: random_owner(&mut rng, &ids),
            };
            let caller = sample_account(ids[rng.gen_range(0..ids.len())], Role::Student);

            let owns = [&post.user, &post.creator, &post.author]
                .into_iter()
                .any(|f| f.as_deref() == Some(caller.id.as_str()));
            assert_eq!(check_ownership(&caller, Some(&post)).is_ok(), owns);
            assert!(check_ownership(&admin, Some(&post)).is_ok());
        }
    }

    #[test]
    fn missing_resource_is_not_found_even_for_admin() {
        let admin = sample_account("root", Role::Admin);
        let err = check_ownership::<Post>(&admin, None).unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[test]
    fn group_levels_follow_club_precedence() {
        let (club, _) = sample_club("boss", false)
            .request_join("mod", None, Utc::now())
            .unwrap();
        let (club, _) = club.request_join("plain", None, Utc::now()).unwrap();
        let (club, _) = club.promote("mod", ModeratorTitle::Coordinator, Utc::now()).unwrap();

        let boss = sample_account("boss", Role::ClubAdmin);
        let moderator = sample_account("mod", Role::Student);
        let plain = sample_account("plain", Role::Student);
        let outsider = sample_account("outsider", Role::Student);
        let platform_admin = sample_account("root", Role::Admin);

        for level in [GroupPermission::Member, GroupPermission::Moderator, GroupPermission::Admin] {
            assert!(check_group_permission(&boss, &club, level).is_ok());
        }
        assert!(check_group_permission(&moderator, &club, GroupPermission::Moderator).is_ok());
        assert!(check_group_permission(&moderator, &club, GroupPermission::Admin).is_err());
        assert_eq!(
            check_group_permission(&plain, &club, GroupPermission::Member).unwrap(),
            GroupRole::Member
        );
        assert!(check_group_permission(&plain, &club, GroupPermission::Moderator).is_err());
        assert!(check_group_permission(&outsider, &club, GroupPermission::Member).is_err());

        assert!(check_group_permission(&platform_admin, &club, GroupPermission::Admin).is_ok());
        assert!(check_group_permission(&platform_admin, &club, GroupPermission::Moderator).is_err());
    }
}
