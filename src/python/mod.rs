use crate::config::ServiceConfig;
use crate::core::{Error, Scope};
use crate::relation::{
    ChangeEvent, ChildObject, CredentialProfile, RelationFamily, RelationService, RelationStore,
    Subscriber, SubscriberRegistry,
};
use crate::storage::{
    BackendDescriptor, BackendRegistry, DeletionGuard, DescriptorId, DescriptorStore,
    FilterParams, StorageAssignments, StorageFamily, StorageService,
};
use pyo3::exceptions::{PyKeyError, PyPermissionError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::Runtime;

impl From<Error> for PyErr {
    fn from(e: Error) -> Self {
        match &e {
            Error::NotFound(_) => PyKeyError::new_err(e.to_string()),
            Error::DeletionRefused(reason) => PyPermissionError::new_err(reason.message()),
            Error::InvalidFilter { .. }
            | Error::Config(_)
            | Error::Conflict(_)
            | Error::SerializationError(_) => PyValueError::new_err(e.to_string()),
            _ => PyRuntimeError::new_err(e.to_string()),
        }
    }
}

fn runtime() -> PyResult<Runtime> {
    Runtime::new().map_err(|e| PyRuntimeError::new_err(e.to_string()))
}

fn scope(org: Option<String>) -> Scope {
    match org {
        Some(org) => Scope::org(&org),
        None => Scope::Root,
    }
}

fn parse_tag<T: serde::de::DeserializeOwned>(tag: &str) -> PyResult<T> {
    Ok(serde_json::from_value(serde_json::Value::String(tag.to_string())).map_err(Error::from)?)
}

fn to_json<T: serde::Serialize>(value: &T) -> PyResult<String> {
    Ok(serde_json::to_string(value).map_err(Error::from)?)
}

// --- Storage Bindings ---

#[pyclass(name = "StorageService")]
pub struct PyStorageService {
    inner: StorageService,
    assignments: Arc<StorageAssignments>,
    runtime: Runtime,
}

#[pymethods]
impl PyStorageService {
    #[new]
    fn new(config_json: Option<String>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => ServiceConfig::from_json(&json)?,
            None => ServiceConfig::default(),
        };
        let assignments = Arc::new(StorageAssignments::new());
        let inner = StorageService::new(
            Arc::new(DescriptorStore::with_system_defaults()?),
            Arc::new(BackendRegistry::with_builtin()),
            DeletionGuard::new().with_lookup(assignments.clone()),
            &config.probe,
        );
        Ok(Self {
            inner,
            assignments,
            runtime: runtime()?,
        })
    }

    fn create(&self, descriptor_json: String) -> PyResult<String> {
        let descriptor: BackendDescriptor =
            serde_json::from_str(&descriptor_json).map_err(Error::from)?;
        to_json(&self.inner.create_descriptor(descriptor)?)
    }

    fn list(&self, family: &str) -> PyResult<String> {
        to_json(&self.inner.list_descriptors(parse_tag::<StorageFamily>(family)?)?)
    }

    fn tree(
        &self,
        family: &str,
        params: Option<HashMap<String, String>>,
        org: Option<String>,
    ) -> PyResult<String> {
        let family = parse_tag::<StorageFamily>(family)?;
        let params: FilterParams = params.unwrap_or_default();
        let nodes = self
            .runtime
            .block_on(self.inner.tree(&scope(org), family, &params))?;
        to_json(&nodes)
    }

    fn test_connective(&self, id: String) -> PyResult<String> {
        let report = self
            .runtime
            .block_on(self.inner.test_connective(&DescriptorId::new(&id)))?;
        to_json(&report)
    }

    fn delete(&self, id: String) -> PyResult<()> {
        Ok(self
            .inner
            .delete_descriptor(&DescriptorId::new(&id))?
            .into_result()?)
    }

    fn assign(&self, consumer: String, family: &str, storage: String) -> PyResult<()> {
        Ok(self
            .assignments
            .assign(&consumer, parse_tag::<StorageFamily>(family)?, &storage)?)
    }

    fn release(&self, consumer: String, family: &str) -> PyResult<()> {
        Ok(self
            .assignments
            .release(&consumer, parse_tag::<StorageFamily>(family)?)?)
    }
}

// --- Relation Bindings ---

/// Python callable receiving each event as JSON.
struct PyCallback {
    id: String,
    callback: PyObject,
}

impl Subscriber for PyCallback {
    fn id(&self) -> &str {
        &self.id
    }

    fn on_change(&self, event: &ChangeEvent) -> crate::Result<()> {
        let payload = serde_json::to_string(event)?;
        Python::with_gil(|py| {
            self.callback
                .call1(py, (payload,))
                .map(|_| ())
                .map_err(|e| Error::Internal(e.to_string()))
        })
    }
}

#[pyclass(name = "RelationService")]
pub struct PyRelationService {
    inner: RelationService,
}

#[pymethods]
impl PyRelationService {
    #[new]
    fn new() -> Self {
        PyRelationService {
            inner: RelationService::new(
                Arc::new(RelationStore::new()),
                Arc::new(SubscriberRegistry::new()),
            ),
        }
    }

    fn register_profile(&self, id: String, org_id: String, name: String, username: String) -> PyResult<()> {
        Ok(self
            .inner
            .store()
            .register_profile(CredentialProfile::new(&id, &org_id, &name, &username))?)
    }

    fn register_child(&self, child_json: String) -> PyResult<()> {
        let child: ChildObject = serde_json::from_str(&child_json).map_err(Error::from)?;
        Ok(self.inner.store().register_child(child)?)
    }

    fn subscribe(&self, id: String, callback: PyObject) -> PyResult<()> {
        Ok(self.inner.subscribers().subscribe(Arc::new(PyCallback { id, callback }))?)
    }

    fn attach(
        &self,
        family: &str,
        parent_ids: Vec<String>,
        child_ids: Vec<String>,
        org: Option<String>,
    ) -> PyResult<String> {
        let family = parse_tag::<RelationFamily>(family)?;
        let outcome = self.inner.attach(&scope(org), family, &parent_ids, &child_ids)?;
        to_json(&outcome)
    }

    fn list(&self, family: &str, org: Option<String>) -> PyResult<String> {
        let family = parse_tag::<RelationFamily>(family)?;
        to_json(&self.inner.list(&scope(org), family)?)
    }
}

// --- Module ---

#[pymodule]
fn bastion_audit(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyStorageService>()?;
    m.add_class::<PyRelationService>()?;
    Ok(())
}
