//! Field allow-lists for common directory resources

use crate::fields::{Field, FieldSet};

/// Resource names accepted by [`by_name`]
pub const RESOURCES: &[&str] = &[
    "applications",
    "system_users",
    "user_groups",
    "radius_servers",
    "commands",
];

/// Look up a preset by resource name. `-` and `_` are interchangeable.
pub fn by_name(name: &str) -> Option<FieldSet> {
    match name.to_lowercase().replace('-', "_").as_str() {
        "applications" => Some(applications()),
        "system_users" | "users" => Some(system_users()),
        "user_groups" | "groups" => Some(user_groups()),
        "radius_servers" => Some(radius_servers()),
        "commands" => Some(commands()),
        _ => None,
    }
}

/// SSO applications
pub fn applications() -> FieldSet {
    FieldSet::new()
        .with(Field::string("_id").with_output("id").with_sortable(false))
        .with(Field::string("name"))
        .with(Field::string("displayName"))
        .with(Field::string("displayLabel"))
        .with(Field::string("type"))
        .with(Field::string("status"))
        .with(Field::string("publisher"))
        .with(Field::string("ssoUrl").output_only())
        .with(Field::string("learnMore").output_only())
        .with(Field::boolean("active"))
        .with(Field::date("created"))
        .with(Field::json("config").output_only())
}

/// Directory users
pub fn system_users() -> FieldSet {
    FieldSet::new()
        .with(Field::string("_id").with_output("id").with_sortable(false))
        .with(Field::string("username"))
        .with(Field::string("email"))
        .with(Field::string("firstname"))
        .with(Field::string("lastname"))
        .with(Field::string("displayname"))
        .with(Field::string("department"))
        .with(Field::string("employeeType"))
        .with(Field::string("state"))
        .with(Field::boolean("activated"))
        .with(Field::boolean("suspended"))
        .with(Field::boolean("mfa.configured").with_output("mfa_configured"))
        .with(Field::number("unix_uid"))
        .with(Field::date("created"))
        .with(Field::json("attributes").output_only())
}

/// User groups
pub fn user_groups() -> FieldSet {
    FieldSet::new()
        .with(Field::string("id").with_sortable(false))
        .with(Field::string("name"))
        .with(Field::string("description"))
        .with(Field::string("type"))
        .with(Field::string("email"))
        .with(Field::number("attributes.posixGroups.0.id").with_output("posix_gid"))
        .with(Field::json("memberQuery").output_only())
}

/// RADIUS servers
pub fn radius_servers() -> FieldSet {
    FieldSet::new()
        .with(Field::string("_id").with_output("id").with_sortable(false))
        .with(Field::string("name"))
        .with(Field::string("networkSourceIp"))
        .with(Field::string("authIdp"))
        .with(Field::boolean("mfa"))
        .with(Field::string("userLockoutAction").output_only())
        .with(Field::number("userLockoutAttempts"))
        .with(Field::string("sharedSecret").output_only())
        .with(Field::json("tagNames").output_only())
}

/// Commands run on managed devices
pub fn commands() -> FieldSet {
    FieldSet::new()
        .with(Field::string("_id").with_output("id").with_sortable(false))
        .with(Field::string("name"))
        .with(Field::string("command").with_sortable(false))
        .with(Field::string("commandType"))
        .with(Field::string("launchType"))
        .with(Field::string("user"))
        .with(Field::string("trigger"))
        .with(Field::number("timeout"))
        .with(Field::string("scheduleRepeatType").output_only())
        .with(Field::boolean("sudo"))
        .with(Field::date("schedule"))
        .with(Field::string("organization").output_only())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dq_core::FieldKind;

    #[test]
    fn test_every_resource_resolves() {
        for name in RESOURCES {
            let set = by_name(name).unwrap();
            assert!(set.contains("name"), "{} has no name field", name);
            assert!(set.sortable("name").is_ok());
        }
        assert!(by_name("radius-servers").is_some());
        assert!(by_name("Groups").is_some());
        assert!(by_name("webhooks").is_none());
    }

    #[test]
    fn test_output_names() {
        let outputs: Vec<_> = applications()
            .projection()
            .fields()
            .iter()
            .map(|f| f.output.clone())
            .collect();
        assert_eq!(&outputs[..4], &["id", "name", "display_name", "display_label"]);
        assert!(outputs.contains(&"sso_url".to_string()));

        let spec = radius_servers().projection();
        assert!(spec.fields().iter().any(|f| f.output == "network_source_ip"));
    }

    #[test]
    fn test_kinds_and_flags() {
        let commands = commands();
        assert_eq!(commands.get("timeout").map(|f| f.kind), Some(FieldKind::Number));
        assert!(commands.sortable("command").is_err());
        assert!(commands.filterable("command").is_ok());

        let users = system_users();
        assert!(users.filterable("attributes").is_err());
        assert_eq!(users.get("mfa.configured").map(|f| f.kind), Some(FieldKind::Bool));
    }
}
