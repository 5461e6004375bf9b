/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Users, the active session and security posture

use super::NormalizationContext;
use crate::domain::{ActiveUser, RawAttributeRecord, SecurityPosture, UserAccount};

/// Build one local account.
///
/// UserAccount fields: `name`, `full_name`, `description`, `disabled`,
/// `lockout`, `last_login`, `home_directory`.
pub fn normalize_user(ctx: &NormalizationContext<'_>, account: &RawAttributeRecord) -> UserAccount {
    let r = ctx.reader(account);
    UserAccount {
        name: r.text("name"),
        full_name: r.text("full_name"),
        description: r.text("description"),
        is_active: r.boolean("disabled").map(|disabled| !disabled),
        is_locked: r.boolean("lockout"),
        last_login: r.date("last_login"),
        home_directory: r.text("home_directory"),
    }
}

/// Build the active session user.
///
/// ActiveUser fields: `name` (optionally `DOMAIN\name`), `domain`,
/// `full_name`, `login_time`, `session_type`, `home_directory`. Missing
/// full name and home directory are taken from the matching local account.
pub fn normalize_active_user(
    ctx: &NormalizationContext<'_>,
    session: &RawAttributeRecord,
    users: &[UserAccount],
) -> ActiveUser {
    let r = ctx.reader(session);
    let (domain, name) = match r.text("name") {
        Some(qualified) => match qualified.split_once('\\') {
            Some((domain, name)) => (Some(domain.to_string()), Some(name.to_string())),
            None => (None, Some(qualified)),
        },
        None => (None, None),
    };
    let account = name
        .as_deref()
        .and_then(|n| users.iter().find(|u| u.name.as_deref() == Some(n)));

    ActiveUser {
        domain: r.text("domain").or(domain),
        full_name: r
            .text("full_name")
            .or_else(|| account.and_then(|a| a.full_name.clone())),
        home_directory: r
            .text("home_directory")
            .or_else(|| account.and_then(|a| a.home_directory.clone())),
        login_time: r.date("login_time"),
        session_type: r.text("session_type"),
        name,
    }
}

/// Build the security posture.
///
/// Security fields: `firewall_enabled`, `antivirus_enabled`,
/// `disk_encryption_enabled`, `privilege_elevation_enabled`,
/// `security_center`.
pub fn normalize_security(
    ctx: &NormalizationContext<'_>,
    security: Option<&RawAttributeRecord>,
) -> SecurityPosture {
    let r = ctx.reader_opt(security);
    SecurityPosture {
        firewall_enabled: r.boolean("firewall_enabled"),
        antivirus_enabled: r.boolean("antivirus_enabled"),
        disk_encryption_enabled: r.boolean("disk_encryption_enabled"),
        privilege_elevation_enabled: r.boolean("privilege_elevation_enabled"),
        security_center: r.text("security_center"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetRegistry, PlaceholderFilter};

    #[test]
    fn test_user_flags() {
        let registry = DatasetRegistry::empty();
        let filter = PlaceholderFilter::default();
        let ctx = NormalizationContext::new(&registry, &filter);
        let record = RawAttributeRecord::new()
            .with("name", "alice")
            .with("disabled", false)
            .with("lockout", "1")
            .with("home_directory", "/home/alice");

        let user = normalize_user(&ctx, &record);
        assert_eq!(user.is_active, Some(true));
        assert_eq!(user.is_locked, Some(true));
        assert_eq!(user.full_name, None);
    }

    #[test]
    fn test_active_user_splits_domain_and_borrows_account_details() {
        let registry = DatasetRegistry::empty();
        let filter = PlaceholderFilter::default();
        let ctx = NormalizationContext::new(&registry, &filter);
        let users = vec![UserAccount {
            name: Some("alice".to_string()),
            full_name: Some("Alice Example".to_string()),
            home_directory: Some("/home/alice".to_string()),
            ..Default::default()
        }];
        let session = RawAttributeRecord::new()
            .with("name", "WORKGROUP\\alice")
            .with("session_type", "Console");

        let active = normalize_active_user(&ctx, &session, &users);
        assert_eq!(active.name.as_deref(), Some("alice"));
        assert_eq!(active.domain.as_deref(), Some("WORKGROUP"));
        assert_eq!(active.full_name.as_deref(), Some("Alice Example"));
        assert_eq!(active.home_directory.as_deref(), Some("/home/alice"));
        assert_eq!(active.session_type.as_deref(), Some("Console"));
    }

    #[test]
    fn test_security_posture() {
        let registry = DatasetRegistry::empty();
        let filter = PlaceholderFilter::default();
        let ctx = NormalizationContext::new(&registry, &filter);
        let record = RawAttributeRecord::new()
            .with("firewall_enabled", "active")
            .with("disk_encryption_enabled", false)
            .with("security_center", "systemd");

        let posture = normalize_security(&ctx, Some(&record));
        assert_eq!(posture.firewall_enabled, Some(true));
        assert_eq!(posture.disk_encryption_enabled, Some(false));
        assert_eq!(posture.antivirus_enabled, None);
        assert_eq!(normalize_security(&ctx, None), SecurityPosture::default());
    }
}
