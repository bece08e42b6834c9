//! Client adapter: request/response calls over a line-delimited byte stream.
//!
//! Each call gets a fresh correlation id. Responses are routed to the
//! waiting caller by id, whatever order they arrive in. A call that times
//! out stops waiting; a late response for it is logged and dropped.

mod process;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::{
    api::{Request, Response},
    config::ClientConfig,
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDetails, NewBook},
        member::{Member, MemberDetails, NewMember},
        query::SearchQuery,
    },
};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// State shared between callers and the response reader
struct Shared {
    pending: Mutex<HashMap<u64, oneshot::Sender<Response>>>,
    ready: AtomicBool,
}

impl Shared {
    /// Hand a response to its waiter, if it is still waiting
    async fn route(&self, response: Response) {
        let waiter = self.pending.lock().await.remove(&response.id);
        match waiter {
            Some(tx) => {
                let id = response.id;
                // The caller may have timed out between removal and send
                if tx.send(response).is_err() {
                    tracing::warn!("Received response for abandoned request: {}", id);
                }
            }
            None => tracing::warn!("Received response for unknown request: {}", response.id),
        }
    }

    /// Mark the channel dead and fail every waiter
    async fn shut_down(&self) {
        self.ready.store(false, Ordering::SeqCst);
        let mut pending = self.pending.lock().await;
        if !pending.is_empty() {
            tracing::warn!("Failing {} pending request(s): backend channel closed", pending.len());
        }
        pending.clear();
    }
}

/// Client for the catalog engine
pub struct CatalogClient {
    shared: Arc<Shared>,
    writer: Mutex<BoxedWriter>,
    next_id: AtomicU64,
    timeout: Duration,
    reader_task: JoinHandle<()>,
    child: Mutex<Option<Child>>,
}

impl CatalogClient {
    /// Talk to an engine over an already-open byte stream
    pub fn connect<R, W>(reader: R, writer: W, config: &ClientConfig) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let shared = Arc::new(Shared {
            pending: Mutex::new(HashMap::new()),
            ready: AtomicBool::new(true),
        });
        let reader_task = tokio::spawn(read_responses(reader, shared.clone()));

        Self {
            shared,
            writer: Mutex::new(Box::new(writer)),
            next_id: AtomicU64::new(0),
            timeout: config.timeout(),
            reader_task,
            child: Mutex::new(None),
        }
    }

    /// Per-call response timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::SeqCst)
    }

    /// Number of calls still waiting for a response
    pub async fn pending_count(&self) -> usize {
        self.shared.pending.lock().await.len()
    }

    /// Send one request and wait for its response.
    ///
    /// Writing the request and waiting for the answer share one deadline.
    pub async fn call(&self, method: &str, params: Value) -> AppResult<Value> {
        if !self.is_ready() {
            return Err(AppError::ChannelNotReady);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let line = Request::new(id, method, params).to_line()?;

        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().await.insert(id, tx);

        // The reader may have shut down between the check above and the insert
        if !self.is_ready() {
            self.shared.pending.lock().await.remove(&id);
            return Err(AppError::ChannelNotReady);
        }

        let deadline = Instant::now() + self.timeout;

        match tokio::time::timeout_at(deadline, self.write_line(&line)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.shared.pending.lock().await.remove(&id);
                self.shared.ready.store(false, Ordering::SeqCst);
                tracing::error!("Failed to send {} (id={}): {}", method, id, e);
                return Err(e);
            }
            Err(_) => {
                // A partial line may be stuck in the stream; it cannot carry more requests
                self.shared.pending.lock().await.remove(&id);
                self.shared.ready.store(false, Ordering::SeqCst);
                tracing::error!("Backend stopped reading requests: {} (id={})", method, id);
                return Err(AppError::Timeout {
                    method: method.to_string(),
                });
            }
        }

        match tokio::time::timeout_at(deadline, rx).await {
            Ok(Ok(response)) => response.into_result(),
            Ok(Err(_)) => Err(AppError::ChannelClosed),
            Err(_) => {
                self.shared.pending.lock().await.remove(&id);
                tracing::warn!("Backend call timeout: {} (id={})", method, id);
                Err(AppError::Timeout {
                    method: method.to_string(),
                })
            }
        }
    }

    async fn write_line(&self, line: &str) -> AppResult<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    async fn call_as<T: DeserializeOwned>(&self, method: &str, params: Value) -> AppResult<T> {
        let data = self.call(method, params).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Stop the session: fail pending calls and kill a spawned engine
    pub async fn close(&self) {
        self.shared.shut_down().await;
        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(e) = child.kill().await {
                tracing::warn!("Failed to stop backend process: {}", e);
            }
        }
    }

    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.call_as("listBooks", json!({})).await
    }

    pub async fn list_members(&self) -> AppResult<Vec<Member>> {
        self.call_as("listMembers", json!({})).await
    }

    pub async fn get_book(&self, book_id: i64) -> AppResult<Book> {
        self.call_as("getBook", json!({ "bookID": book_id })).await
    }

    pub async fn get_member(&self, member_id: i64) -> AppResult<Member> {
        self.call_as("getMember", json!({ "memberID": member_id })).await
    }

    /// Add a book; returns its id
    pub async fn add_book(&self, book: &NewBook) -> AppResult<i64> {
        let data = self
            .call(
                "addBook",
                json!({
                    "title": book.title,
                    "author": book.author,
                    "isbn": book.isbn,
                    "genre": book.genre,
                    "coverUrl": book.cover_url,
                }),
            )
            .await?;
        created_id(&data)
    }

    /// Add a member; returns its id
    pub async fn add_member(&self, member: &NewMember) -> AppResult<i64> {
        let data = self
            .call(
                "addMember",
                json!({ "name": member.name, "address": member.address }),
            )
            .await?;
        created_id(&data)
    }

    pub async fn update_book(&self, book_id: i64, details: &BookDetails) -> AppResult<Book> {
        self.call_as(
            "updateBook",
            json!({
                "bookID": book_id,
                "title": details.title,
                "author": details.author,
                "isbn": details.isbn,
                "genre": details.genre,
                "coverUrl": details.cover_url,
            }),
        )
        .await
    }

    pub async fn update_member(&self, member_id: i64, details: &MemberDetails) -> AppResult<Member> {
        self.call_as(
            "updateMember",
            json!({ "memberID": member_id, "name": details.name, "address": details.address }),
        )
        .await
    }

    pub async fn checkout_book(&self, book_id: i64, member_id: i64) -> AppResult<()> {
        self.call("checkoutBook", json!({ "bookID": book_id, "memberID": member_id }))
            .await?;
        Ok(())
    }

    pub async fn return_book(&self, book_id: i64, member_id: Option<i64>) -> AppResult<()> {
        self.call("returnBook", json!({ "bookID": book_id, "memberID": member_id }))
            .await?;
        Ok(())
    }

    pub async fn delete_book(&self, book_id: i64) -> AppResult<()> {
        self.call("delete-book", json!({ "bookID": book_id })).await?;
        Ok(())
    }

    pub async fn delete_member(&self, member_id: i64) -> AppResult<()> {
        self.call("delete-member", json!({ "memberID": member_id }))
            .await?;
        Ok(())
    }

    pub async fn search_books(&self, query: &str) -> AppResult<Vec<Book>> {
        self.call_as("searchBooks", json!({ "query": query })).await
    }

    /// Numeric input searches by member id, anything else by name/address
    pub async fn search_member(&self, query: &str) -> AppResult<Vec<Member>> {
        let params = match SearchQuery::parse(query) {
            SearchQuery::ById(id) => json!({ "memberID": id }),
            SearchQuery::ByText(text) => json!({ "query": text }),
        };
        self.call_as("searchMember", params).await
    }

    pub async fn member_loans(&self, member_id: i64) -> AppResult<Vec<Book>> {
        self.call_as("memberLoans", json!({ "memberID": member_id }))
            .await
    }

    pub async fn recommend_books(&self, limit: Option<usize>) -> AppResult<Vec<Book>> {
        self.call_as("recommendBooks", json!({ "limit": limit })).await
    }

    pub async fn health(&self) -> AppResult<Value> {
        self.call("health", json!({})).await
    }
}

impl Drop for CatalogClient {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

fn created_id(data: &Value) -> AppResult<i64> {
    data.get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| AppError::Internal("response carries no id".to_string()))
}

async fn read_responses<R>(reader: R, shared: Arc<Shared>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Response>(line) {
                    Ok(response) => shared.route(response).await,
                    Err(e) => tracing::error!("Failed to parse backend response ({}): {}", e, line),
                }
            }
            Ok(None) => {
                tracing::info!("Backend channel closed");
                break;
            }
            Err(e) => {
                tracing::error!("Backend channel error: {}", e);
                break;
            }
        }
    }
    shared.shut_down().await;
}
