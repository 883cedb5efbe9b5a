//! Service worker: executes directory-service calls off the event loop.
//!
//! The picker enqueues [`ServiceTask`]s; each is run on a blocking thread
//! and its completion is posted back as an [`Event`]. Tasks are spawned
//! independently, so loads for different branches proceed concurrently
//! while each result is still applied atomically on the event loop.

use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::event::Event;
use crate::service::{DirectoryService, ServiceError};

/// A unit of service work, tagged with the tree generation that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceTask {
    List {
        generation: u64,
        path: String,
    },
    CreateDir {
        generation: u64,
        parent: String,
        name: String,
    },
}

pub async fn worker_loop(
    service: Arc<dyn DirectoryService>,
    mut task_rx: UnboundedReceiver<ServiceTask>,
    event_tx: UnboundedSender<Event>,
) {
    while let Some(task) = task_rx.recv().await {
        let service = Arc::clone(&service);
        let event_tx = event_tx.clone();
        tokio::spawn(async move {
            match task {
                ServiceTask::List { generation, path } => {
                    let request_path = path.clone();
                    let result = tokio::task::spawn_blocking(move || {
                        service.list_directory(&request_path)
                    })
                    .await;
                    let _ = event_tx.send(Event::ListingLoaded {
                        generation,
                        path,
                        result: flatten_join(result),
                    });
                }
                ServiceTask::CreateDir {
                    generation,
                    parent,
                    name,
                } => {
                    let request_parent = parent.clone();
                    let request_name = name.clone();
                    let result = tokio::task::spawn_blocking(move || {
                        service.create_directory(&request_parent, &request_name)
                    })
                    .await;
                    let _ = event_tx.send(Event::FolderCreated {
                        generation,
                        parent,
                        name,
                        result: flatten_join(result),
                    });
                }
            }
        });
    }
}

fn flatten_join<T>(
    res: Result<Result<T, ServiceError>, tokio::task::JoinError>,
) -> Result<T, ServiceError> {
    match res {
        Ok(inner) => inner,
        Err(join) => Err(ServiceError::Remote(format!("worker task failed: {join}"))),
    }
}
