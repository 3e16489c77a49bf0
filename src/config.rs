use std::{fmt, rc::Rc};

use bindery_reactive::DependencyPolicy;
use serde::Deserialize;

use crate::error::{Error, Warning};

pub type WarnHandler = Rc<dyn Fn(&Warning)>;

/// Instance-wide settings.
///
/// The serialisable part can be read from JSON:
///
/// ```rust
/// use bindery::{Config, DependencyPolicy};
///
/// let config = Config::from_json_str(r#"{ "dependency_policy": "unique" }"#).unwrap();
/// assert_eq!(config.dependency_policy, DependencyPolicy::Unique);
/// assert!(!config.silent);
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Drop every warning instead of reporting it.
    pub silent: bool,
    pub dependency_policy: DependencyPolicy,
    #[serde(skip)]
    warn_handler: Option<WarnHandler>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Config");
        s.field("silent", &self.silent);
        s.field("dependency_policy", &self.dependency_policy);
        s.field("warn_handler", &self.warn_handler.is_some());
        s.finish()
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn dependency_policy(mut self, policy: DependencyPolicy) -> Self {
        self.dependency_policy = policy;
        self
    }

    /// Route warnings to `handler` instead of the log.
    pub fn with_warn_handler(mut self, handler: impl Fn(&Warning) + 'static) -> Self {
        self.warn_handler = Some(Rc::new(handler));
        self
    }

    pub(crate) fn report(&self, warning: Warning) {
        if self.silent {
            return;
        }
        if let Some(handler) = &self.warn_handler {
            handler(&warning);
            return;
        }
        match warning {
            Warning::ComputedWithoutSetter { .. } => tracing::error!("{warning}"),
            Warning::UnknownProperty { .. } | Warning::ComputedShadowsData { .. } => {
                tracing::warn!("{warning}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn empty_json_is_default() {
        let config = Config::from_json_str("{}").unwrap();
        assert!(!config.silent);
        assert_eq!(config.dependency_policy, DependencyPolicy::Duplicate);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = Config::from_json_str(r#"{ "silent": "yes" }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn silent_suppresses_handler() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let config = Config::new()
            .with_warn_handler({
                let seen = seen.clone();
                move |w| seen.borrow_mut().push(w.clone())
            })
            .silent(true);

        config.report(Warning::UnknownProperty { key: "x".into() });
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn handler_receives_warning() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let config = Config::new().with_warn_handler({
            let seen = seen.clone();
            move |w| seen.borrow_mut().push(w.clone())
        });

        config.report(Warning::UnknownProperty { key: "x".into() });
        assert_eq!(seen.borrow()[0].key(), "x");
    }
}
