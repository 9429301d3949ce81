//! Service registry
//!
//! Tracks long-running services by name. Each registration hands out a
//! `ServiceHandle` carrying the cancellation signal for that service.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::logic::error::DriftError;

pub trait ServiceRegistry: Send + Sync {
    fn register_service(&self, name: &str) -> Result<ServiceHandle, DriftError>;
    fn unregister_service(&self, name: &str);
}

/// Cancellation handle of one registered service
#[derive(Clone)]
pub struct ServiceHandle {
    name: String,
    trigger: Arc<watch::Sender<bool>>,
    signal: watch::Receiver<bool>,
}

impl ServiceHandle {
    pub fn new(name: &str) -> Self {
        let (trigger, signal) = watch::channel(false);
        Self {
            name: name.to_string(),
            trigger: Arc::new(trigger),
            signal,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancel(&self) {
        self.trigger.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.signal.borrow()
    }

    /// Resolves once the service is cancelled
    pub async fn cancelled(&mut self) {
        while !*self.signal.borrow_and_update() {
            if self.signal.changed().await.is_err() {
                return;
            }
        }
    }
}

/// In-process registry used by the host binary
#[derive(Default)]
pub struct TaskRegistry {
    services: Mutex<HashMap<String, ServiceHandle>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.services.lock().contains_key(name)
    }

    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Signal every registered service to stop
    pub fn shutdown_all(&self) {
        for (name, handle) in self.services.lock().iter() {
            log::info!("Cancelling service '{}'", name);
            handle.cancel();
        }
    }
}

impl ServiceRegistry for TaskRegistry {
    fn register_service(&self, name: &str) -> Result<ServiceHandle, DriftError> {
        let mut services = self.services.lock();
        if services.contains_key(name) {
            return Err(DriftError::ServiceRegistered(name.to_string()));
        }
        let handle = ServiceHandle::new(name);
        services.insert(name.to_string(), handle.clone());
        log::info!("Registered service '{}'", name);
        Ok(handle)
    }

    fn unregister_service(&self, name: &str) {
        if self.services.lock().remove(name).is_some() {
            log::info!("Unregistered service '{}'", name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_register_twice_rejected() {
        let registry = TaskRegistry::new();
        registry.register_service("svc").unwrap();
        assert!(matches!(
            registry.register_service("svc"),
            Err(DriftError::ServiceRegistered(_))
        ));

        registry.unregister_service("svc");
        assert!(!registry.is_registered("svc"));
        assert!(registry.register_service("svc").is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_all_cancels_handles() {
        let registry = TaskRegistry::new();
        let mut handle = registry.register_service("svc").unwrap();
        assert!(!handle.is_cancelled());

        registry.shutdown_all();
        tokio::time::timeout(Duration::from_secs(1), handle.cancelled())
            .await
            .unwrap();
        assert!(handle.is_cancelled());
    }
}
