use crate::dashboard::model::{DashboardState, Role};
use crate::dashboard::widgets::{EntityKind, WidgetRegistry};
use crate::session::{Session, TokenGetter};
use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// Server-side storage of one dashboard document per user.
///
/// Saves overwrite the whole document; the last writer wins.
pub trait DashboardBackend: Send + Sync {
    fn load_dashboard(&self, user_id: &str) -> Result<Option<DashboardState>>;

    fn save_dashboard(&self, user_id: &str, state: &DashboardState) -> Result<()>;
}

/// Entry offered in a project/team picker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityOption {
    pub id: String,
    pub name: String,
}

impl EntityOption {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// Read-only lookup of entities a widget can be bound to.
pub trait EntitySource: Send + Sync {
    fn list_selectable_entities(&self, kind: EntityKind, role: Role) -> Result<Vec<EntityOption>>;
}

/// Picker choices for a widget type's binding. Types without a binding have
/// no choices.
pub fn binding_options(
    registry: &WidgetRegistry,
    source: &dyn EntitySource,
    type_id: &str,
    role: Role,
) -> Result<Vec<EntityOption>> {
    let Some(binding) = registry.descriptor(type_id).and_then(|d| d.binding()) else {
        return Ok(Vec::new());
    };
    let mut options = source
        .list_selectable_entities(binding.kind, role)
        .with_context(|| format!("list selectable {}s", binding.kind.as_str()))?;
    options.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(options)
}

/// Stores each user's dashboard as a JSON file inside `dir`.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(user_id)))
    }
}

impl DashboardBackend for FileBackend {
    fn load_dashboard(&self, user_id: &str) -> Result<Option<DashboardState>> {
        let path = self.path_for(user_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("read dashboard file {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let state = serde_json::from_str(&content)
            .with_context(|| format!("deserialize dashboard file {}", path.display()))?;
        Ok(Some(state))
    }

    fn save_dashboard(&self, user_id: &str, state: &DashboardState) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create dashboard folder {}", self.dir.display()))?;
        let path = self.path_for(user_id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(state).context("serialize dashboard state")?;
        std::fs::write(&tmp, json)
            .with_context(|| format!("write dashboard file {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("replace dashboard file {}", path.display()))
    }
}

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// REST boundary: `GET`/`PUT {base}/dashboards/{user}` and
/// `GET {base}/{projects|teams}?role=..`.
pub struct HttpBackend {
    client: Client,
    base: Url,
    token: TokenGetter,
}

impl HttpBackend {
    pub fn new(base_url: &str, session: &Session) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("parse api base url {base_url}"))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("api base url cannot be a base: {base_url}"));
        }
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base,
            token: session.token_getter(),
        })
    }

    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("api base url cannot be a base: {}", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, req: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match (self.token)() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

impl DashboardBackend for HttpBackend {
    fn load_dashboard(&self, user_id: &str) -> Result<Option<DashboardState>> {
        let url = self.endpoint(&["dashboards", user_id])?;
        let resp = self
            .authorized(self.client.get(url.clone()))
            .send()
            .with_context(|| format!("GET {url}"))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = resp
            .error_for_status()
            .with_context(|| format!("GET {url}"))?
            .text()
            .context("read dashboard body")?;
        let state = serde_json::from_str(&body).context("deserialize dashboard body")?;
        Ok(Some(state))
    }

    fn save_dashboard(&self, user_id: &str, state: &DashboardState) -> Result<()> {
        let url = self.endpoint(&["dashboards", user_id])?;
        let body = serde_json::to_vec(state).context("serialize dashboard state")?;
        self.authorized(self.client.put(url.clone()))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .with_context(|| format!("PUT {url}"))?
            .error_for_status()
            .with_context(|| format!("PUT {url}"))?;
        Ok(())
    }
}

impl EntitySource for HttpBackend {
    fn list_selectable_entities(&self, kind: EntityKind, role: Role) -> Result<Vec<EntityOption>> {
        let collection = match kind {
            EntityKind::Project => "projects",
            EntityKind::Team => "teams",
        };
        let mut url = self.endpoint(&[collection])?;
        url.query_pairs_mut().append_pair("role", role.as_str());
        let body = self
            .authorized(self.client.get(url.clone()))
            .send()
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?
            .text()
            .context("read entity list body")?;
        serde_json::from_str(&body).context("deserialize entity list")
    }
}

/// In-process backend with failure injection.
#[derive(Default)]
pub struct MemoryBackend {
    documents: Mutex<HashMap<String, DashboardState>>,
    entities: Mutex<HashMap<EntityKind, Vec<EntityOption>>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, user_id: &str, state: DashboardState) -> Self {
        if let Ok(mut docs) = self.documents.lock() {
            docs.insert(user_id.to_string(), state);
        }
        self
    }

    pub fn with_entities(self, kind: EntityKind, options: Vec<EntityOption>) -> Self {
        if let Ok(mut entities) = self.entities.lock() {
            entities.insert(kind, options);
        }
        self
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of save attempts received, failed ones included.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn document(&self, user_id: &str) -> Option<DashboardState> {
        self.documents
            .lock()
            .ok()
            .and_then(|docs| docs.get(user_id).cloned())
    }
}

impl DashboardBackend for MemoryBackend {
    fn load_dashboard(&self, user_id: &str) -> Result<Option<DashboardState>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(anyhow!("dashboard service unavailable"));
        }
        let docs = self
            .documents
            .lock()
            .map_err(|_| anyhow!("dashboard store lock poisoned"))?;
        Ok(docs.get(user_id).cloned())
    }

    fn save_dashboard(&self, user_id: &str, state: &DashboardState) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(anyhow!("dashboard service unavailable"));
        }
        let mut docs = self
            .documents
            .lock()
            .map_err(|_| anyhow!("dashboard store lock poisoned"))?;
        docs.insert(user_id.to_string(), state.clone());
        Ok(())
    }
}

impl EntitySource for MemoryBackend {
    fn list_selectable_entities(&self, kind: EntityKind, _role: Role) -> Result<Vec<EntityOption>> {
        let entities = self
            .entities
            .lock()
            .map_err(|_| anyhow!("entity lock poisoned"))?;
        Ok(entities.get(&kind).cloned().unwrap_or_default())
    }
}
