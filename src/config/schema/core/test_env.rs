use std::sync::{LazyLock, Mutex};

/// Serializes tests that touch process environment variables.
pub(super) static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Sets or clears one variable and restores the previous value on drop.
pub(super) struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl EnvVarGuard {
    pub(super) fn set(key: &'static str, value: &str) -> Self {
        let guard = Self::capture(key);
        // SAFETY: callers hold ENV_LOCK for the guard's lifetime.
        unsafe { std::env::set_var(key, value) };
        guard
    }

    pub(super) fn unset(key: &'static str) -> Self {
        let guard = Self::capture(key);
        // SAFETY: callers hold ENV_LOCK for the guard's lifetime.
        unsafe { std::env::remove_var(key) };
        guard
    }

    fn capture(key: &'static str) -> Self {
        Self {
            key,
            previous: std::env::var(key).ok(),
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        // SAFETY: ENV_LOCK is still held by the enclosing test.
        unsafe {
            match &self.previous {
                Some(value) => std::env::set_var(self.key, value),
                None => std::env::remove_var(self.key),
            }
        }
    }
}
