//! Access-rights filter appended to every search.
//!
//! Records carry one or more `ACCESSCONDITION` values. A user may see a record
//! in a hit list if it is open access, or if they hold the listing privilege
//! for one of its license types and no overriding license they lack applies.

use std::collections::HashSet;

use crate::config::{LicenseTypeConfig, SearchConfig};
use crate::index::fields;
use crate::query::escape::quote;

/// Someone whose listing privileges decide which records appear in results.
pub trait AccessIdentity {
    /// Whether the identity may list records under the given license type.
    fn may_list(&self, license_type: &str) -> bool;

    /// Identities that bypass the access filter entirely.
    fn is_superuser(&self) -> bool {
        false
    }
}

/// An identity without any privileges.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl AccessIdentity for Anonymous {
    fn may_list(&self, _license_type: &str) -> bool {
        false
    }
}

/// An identity that sees everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Superuser;

impl AccessIdentity for Superuser {
    fn may_list(&self, _license_type: &str) -> bool {
        true
    }

    fn is_superuser(&self) -> bool {
        true
    }
}

/// An identity holding listing privileges for a fixed set of license types.
#[derive(Debug, Clone, Default)]
pub struct LicenseHolder {
    license_types: HashSet<String>,
}

impl LicenseHolder {
    pub fn new<I, S>(license_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LicenseHolder {
            license_types: license_types.into_iter().map(Into::into).collect(),
        }
    }
}

impl AccessIdentity for LicenseHolder {
    fn may_list(&self, license_type: &str) -> bool {
        self.license_types.contains(license_type)
    }
}

fn may_list(config: &SearchConfig, identity: &dyn AccessIdentity, license_type: &str) -> bool {
    config
        .license_type(license_type)
        .is_some_and(|l| l.open_listing)
        || identity.may_list(license_type)
}

/// All license types overriding `license`, directly or through a chain.
fn overriding_closure<'a>(config: &'a SearchConfig, license: &'a LicenseTypeConfig) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    let mut pending: Vec<&str> = license
        .overriding_license_types
        .iter()
        .map(String::as_str)
        .collect();
    while let Some(name) = pending.pop() {
        if name == license.name || seen.contains(&name) {
            continue;
        }
        seen.push(name);
        if let Some(overrider) = config.license_type(name) {
            pending.extend(overrider.overriding_license_types.iter().map(String::as_str));
        }
    }
    seen
}

fn access_condition(license_type: &str) -> String {
    format!("{}:{}", fields::ACCESSCONDITION, quote(license_type))
}

/// Build the access filter suffix for an identity.
///
/// The result is a single mandatory clause starting with a space, or an empty
/// string for superusers.
pub fn personal_filter_query_suffix(config: &SearchConfig, identity: &dyn AccessIdentity) -> String {
    if identity.is_superuser() {
        return String::new();
    }

    let mut clauses = vec![access_condition(fields::OPEN_ACCESS_VALUE)];
    for license in &config.license_types {
        if may_list(config, identity, &license.name) {
            let excluded: Vec<String> = overriding_closure(config, license)
                .into_iter()
                .filter(|name| !may_list(config, identity, name))
                .map(|name| format!("-{}", access_condition(name)))
                .collect();
            if excluded.is_empty() {
                clauses.push(access_condition(&license.name));
            } else {
                clauses.push(format!(
                    "(+{} {})",
                    access_condition(&license.name),
                    excluded.join(" ")
                ));
            }
        } else if license.moving_wall {
            clauses.push(format!(
                "(+{} -{}:[NOW TO *])",
                access_condition(&license.name),
                config.moving_wall_field
            ));
        }
    }

    format!(" +({})", clauses.join(" "))
}
