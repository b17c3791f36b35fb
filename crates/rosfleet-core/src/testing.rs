// In-memory RouterOS stand-in for unit tests.
//
// Menus are plain row tables keyed by path (`/ip/route`, `/interface`, ...).
// `print` honours equality queries, `add` assigns a `*N` id and answers
// `{"ret": id}`, `remove`/`set`/`enable`/`disable` address rows by `.id`,
// `numbers` or `name`. Failures are injected per path or per predicate.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rosfleet_api::{Connector, DeviceCredentials, DeviceSession, Error, Params, Record};
use secrecy::SecretString;

type Predicate = Box<dyn Fn(&str, &Params) -> bool + Send>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum ConnectMode {
    #[default]
    Accept,
    Refuse,
    Unreachable,
    Hang,
}

#[derive(Default)]
struct State {
    tables: BTreeMap<String, Vec<Record>>,
    next_id: u64,
    connect_mode: ConnectMode,
    rejections: Vec<(Predicate, String)>,
    drop_on: Vec<String>,
    connects: usize,
    closes: usize,
    log: Vec<(String, Params)>,
}

/// Fake device. Clones share state, so a test keeps one handle for
/// assertions and gives another to the code under test.
#[derive(Clone, Default)]
pub(crate) struct FakeRouter {
    state: Arc<Mutex<State>>,
}

impl FakeRouter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn credentials() -> DeviceCredentials {
        DeviceCredentials::new("192.0.2.1", "api", SecretString::from("test"))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Seeding and inspection ───────────────────────────────────────

    /// Insert a row into `menu`, assigning an id if it has none.
    pub(crate) fn seed(&self, menu: &str, row: Record) -> String {
        let mut state = self.lock();
        state.insert(menu, row)
    }

    /// Overwrite one field of the row whose `name` is `name`.
    pub(crate) fn set_field(&self, menu: &str, name: &str, key: &str, value: &str) {
        let mut state = self.lock();
        if let Some(row) = state
            .tables
            .get_mut(menu)
            .and_then(|rows| rows.iter_mut().find(|r| r.str("name") == Some(name)))
        {
            row.insert(key, value);
        }
    }

    /// Drop every row of `menu` whose `name` is `name`.
    pub(crate) fn remove_named(&self, menu: &str, name: &str) {
        let mut state = self.lock();
        if let Some(rows) = state.tables.get_mut(menu) {
            rows.retain(|r| r.str("name") != Some(name));
        }
    }

    pub(crate) fn rows(&self, menu: &str) -> Vec<Record> {
        self.lock().tables.get(menu).cloned().unwrap_or_default()
    }

    /// Every command issued so far, in order.
    pub(crate) fn commands(&self) -> Vec<(String, Params)> {
        self.lock().log.clone()
    }

    pub(crate) fn command_count(&self, path: &str) -> usize {
        self.lock().log.iter().filter(|(p, _)| p == path).count()
    }

    pub(crate) fn connects(&self) -> usize {
        self.lock().connects
    }

    pub(crate) fn closes(&self) -> usize {
        self.lock().closes
    }

    // ── Failure injection ────────────────────────────────────────────

    pub(crate) fn refuse_credentials(&self) {
        self.lock().connect_mode = ConnectMode::Refuse;
    }

    pub(crate) fn unreachable(&self) {
        self.lock().connect_mode = ConnectMode::Unreachable;
    }

    pub(crate) fn hang_on_connect(&self) {
        self.lock().connect_mode = ConnectMode::Hang;
    }

    /// Reject every command matching `predicate` with `message`.
    pub(crate) fn reject_when(
        &self,
        predicate: impl Fn(&str, &Params) -> bool + Send + 'static,
        message: &str,
    ) {
        self.lock()
            .rejections
            .push((Box::new(predicate), message.to_owned()));
    }

    /// Drop the link whenever `path` is issued.
    pub(crate) fn drop_link_on(&self, path: &str) {
        self.lock().drop_on.push(path.to_owned());
    }
}

impl State {
    fn insert(&mut self, menu: &str, mut row: Record) -> String {
        let id = if let Some(id) = row.id() {
            id.to_owned()
        } else {
            self.next_id += 1;
            let id = format!("*{:X}", self.next_id);
            row.insert(".id", id.as_str());
            id
        };
        self.tables.entry(menu.to_owned()).or_default().push(row);
        id
    }

    fn handle(&mut self, path: &str, params: &Params) -> Result<Vec<Record>, Error> {
        self.log.push((path.to_owned(), params.clone()));

        if self.drop_on.iter().any(|p| p == path) {
            return Err(Error::ConnectionDropped {
                reason: "connection reset by peer".into(),
            });
        }
        if let Some((_, message)) = self.rejections.iter().find(|(pred, _)| pred(path, params)) {
            return Err(rejected(message));
        }

        let Some((menu, command)) = path.rsplit_once('/') else {
            return Err(rejected("no such command"));
        };

        match command {
            "print" => Ok(self
                .tables
                .get(menu)
                .map(|rows| {
                    rows.iter()
                        .filter(|row| {
                            params
                                .query_pairs()
                                .all(|(k, v)| row.text(k).as_deref() == Some(v))
                        })
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()),
            "add" => {
                let row: Record = params
                    .attributes()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                let id = self.insert(menu, row);
                Ok(vec![Record::new().with("ret", id)])
            }
            "remove" => {
                let targets = targets(params);
                let rows = self.tables.entry(menu.to_owned()).or_default();
                for target in &targets {
                    let Some(pos) = rows.iter().position(|r| matches_target(r, target)) else {
                        return Err(rejected("no such item"));
                    };
                    rows.remove(pos);
                }
                Ok(Vec::new())
            }
            "set" | "enable" | "disable" => {
                let targets = targets(params);
                let rows = self.tables.entry(menu.to_owned()).or_default();
                let indexes: Vec<usize> = if targets.is_empty() {
                    // Singleton menus (identity, dns, ntp client) have one row.
                    if rows.is_empty() {
                        rows.push(Record::new());
                    }
                    vec![0]
                } else {
                    let mut found = Vec::new();
                    for target in &targets {
                        let Some(pos) = rows.iter().position(|r| matches_target(r, target))
                        else {
                            return Err(rejected("no such item"));
                        };
                        found.push(pos);
                    }
                    found
                };
                for index in indexes {
                    let Some(row) = rows.get_mut(index) else {
                        continue;
                    };
                    match command {
                        "enable" => row.insert("disabled", "false"),
                        "disable" => row.insert("disabled", "true"),
                        _ => {
                            for (k, v) in params.attributes() {
                                if k != ".id" && k != "numbers" {
                                    row.insert(k.clone(), v.clone());
                                }
                            }
                        }
                    }
                }
                Ok(Vec::new())
            }
            _ => Ok(Vec::new()),
        }
    }
}

fn rejected(message: &str) -> Error {
    Error::Rejected {
        message: message.to_owned(),
        status: Some(400),
    }
}

fn targets(params: &Params) -> Vec<String> {
    params
        .get(".id")
        .or_else(|| params.get("numbers"))
        .map(|t| t.split(',').map(str::to_owned).collect())
        .unwrap_or_default()
}

fn matches_target(row: &Record, target: &str) -> bool {
    row.id() == Some(target) || row.str("name") == Some(target)
}

// ── Connector / session ──────────────────────────────────────────────

pub(crate) struct FakeSession {
    state: Arc<Mutex<State>>,
    closed: bool,
}

impl Connector for FakeRouter {
    type Session = FakeSession;

    async fn connect(&self, credentials: &DeviceCredentials) -> Result<FakeSession, Error> {
        let mode = {
            let mut state = self.lock();
            state.connects += 1;
            state.connect_mode
        };
        match mode {
            ConnectMode::Accept => Ok(FakeSession {
                state: Arc::clone(&self.state),
                closed: false,
            }),
            ConnectMode::Refuse => Err(Error::Authentication {
                message: "invalid user name or password".into(),
            }),
            ConnectMode::Unreachable => Err(Error::Unreachable {
                host: credentials.host.clone(),
                reason: "connection refused".into(),
            }),
            ConnectMode::Hang => std::future::pending().await,
        }
    }
}

impl DeviceSession for FakeSession {
    async fn write(&mut self, path: &str, params: &Params) -> Result<Vec<Record>, Error> {
        if self.closed {
            return Err(Error::SessionClosed);
        }
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handle(path, params)
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .closes += 1;
        }
    }
}
