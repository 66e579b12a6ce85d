//! Service and provider naming rules.
//!
//! Services are keyed by plain names. During the configuration phase the
//! provider object behind a service lives under a synthetic key built by
//! appending [`PROVIDER_SUFFIX`] to the service name.

use crate::error::{DiError, DiResult};

/// Suffix appended to a service name to form its provider key.
pub const PROVIDER_SUFFIX: &str = "Provider";

/// Built-in name resolving to the injector itself.
pub const INJECTOR: &str = "$injector";

/// Built-in name resolving to the registration API (provider scope only).
pub const PROVIDE: &str = "$provide";

/// Local name under which a decorator receives the value it wraps.
pub const DELEGATE: &str = "$delegate";

/// Names that collide with object built-ins and can never name a service.
const RESERVED: &[&str] = &[
    "hasOwnProperty",
    "isPrototypeOf",
    "propertyIsEnumerable",
    "toLocaleString",
    "toString",
    "valueOf",
    "__proto__",
    "__defineGetter__",
    "__defineSetter__",
    "__lookupGetter__",
    "__lookupSetter__",
];

/// Builds the provider key for a service name.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::key::provider_key;
///
/// assert_eq!(provider_key("http"), "httpProvider");
/// ```
pub fn provider_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len() + PROVIDER_SUFFIX.len());
    key.push_str(name);
    key.push_str(PROVIDER_SUFFIX);
    key
}

/// Returns true for names that are rejected at registration time.
pub fn is_reserved(name: &str) -> bool {
    name.is_empty() || RESERVED.contains(&name)
}

/// Fails with [`DiError::InvalidServiceName`] for reserved names.
pub fn validate_service_name(name: &str) -> DiResult<()> {
    if is_reserved(name) {
        return Err(DiError::InvalidServiceName {
            name: name.to_string(),
        });
    }
    Ok(())
}
