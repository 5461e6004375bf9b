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

//! Local account and session parsing functions

use crate::domain::RawAttributeRecord;
use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use std::collections::HashSet;

/// Lowest uid of a regular (non-system) account
pub const FIRST_REGULAR_UID: u32 = 1000;

/// The kernel's "nobody" uid; it and everything above are not real accounts
const OVERFLOW_UID: u32 = 65534;

const NO_LOGIN_SHELLS: &[&str] = &["nologin", "false"];

/// Names of accounts whose shadow password is locked ("!" or "*" prefix)
pub fn parse_shadow_locks(shadow: &str) -> HashSet<String> {
    shadow
        .lines()
        .filter_map(|line| {
            let mut parts = line.split(':');
            let name = parts.next()?;
            let hash = parts.next()?;
            (hash.starts_with('!') || hash.starts_with('*')).then(|| name.to_string())
        })
        .collect()
}

/// Parse `/etc/passwd` into UserAccount records for regular accounts
///
/// # Arguments
/// * `passwd` - Content of /etc/passwd
/// * `locked` - Accounts known to be locked, from [`parse_shadow_locks`]
pub fn parse_passwd(passwd: &str, locked: Option<&HashSet<String>>) -> Vec<RawAttributeRecord> {
    passwd
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(':').collect();
            if fields.len() < 7 {
                return None;
            }
            let uid: u32 = fields[2].parse().ok()?;
            if !(FIRST_REGULAR_UID..OVERFLOW_UID).contains(&uid) {
                return None;
            }

            let name = fields[0];
            // GECOS: full name, room, work phone, home phone, other
            let mut gecos = fields[4].split(',');
            let full_name = gecos.next().map(str::trim).filter(|s| !s.is_empty());
            let description = gecos
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            let shell = fields[6].trim();
            let active = !NO_LOGIN_SHELLS.iter().any(|s| shell.ends_with(s));

            Some(
                RawAttributeRecord::new()
                    .with("name", name)
                    .with_opt("full_name", full_name)
                    .with_opt("description", Some(description).filter(|d| !d.is_empty()))
                    .with("home_directory", fields[5])
                    .with("disabled", !active)
                    .with_opt("lockout", locked.map(|set| set.contains(name))),
            )
        })
        .collect()
}

/// Session type from a `who` terminal name
fn session_type(terminal: &str) -> &'static str {
    if terminal.starts_with("pts/") {
        "Remote"
    } else if terminal.starts_with(':') || terminal.starts_with("tty") || terminal.starts_with("seat") {
        "Console"
    } else {
        "Other"
    }
}

/// Parse `who` output and return the ActiveUser record for `user`
///
/// Lines look like `alice    tty2         2024-03-01 09:15 (tty2)`. The first
/// session of `user` wins; when `user` has no session, the first line is used.
pub fn parse_who_output(output: &str, user: Option<&str>) -> Option<RawAttributeRecord> {
    let sessions: Vec<Vec<&str>> = output
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .filter(|parts| parts.len() >= 2)
        .collect();

    let session = user
        .and_then(|u| sessions.iter().find(|parts| parts[0] == u))
        .or_else(|| sessions.first())?;

    let login_time = match (session.get(2), session.get(3)) {
        (Some(date), Some(time)) => {
            NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y-%m-%d %H:%M")
                .ok()
                .and_then(|naive| Local.from_local_datetime(&naive).single())
                .map(|local| local.with_timezone(&Utc))
        }
        _ => None,
    };

    Some(
        RawAttributeRecord::new()
            .with("name", session[0])
            .with("session_type", session_type(session[1]))
            .with_opt("login_time", login_time),
    )
}
