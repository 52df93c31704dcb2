//! Result delivery to application code.
//!
//! Callbacks run on the blocking pool and are never awaited, so a slow
//! callback cannot stall frame assembly or delay shutdown. Outside a tokio
//! runtime there is no pool and callbacks run inline on the caller.

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::trace;
use wiegand_core::DecodedResult;

/// Receives the decimal tag of each accepted frame.
pub type TagCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Receives the full decoded result, site code included.
pub type ResultCallback = Arc<dyn Fn(DecodedResult) + Send + Sync>;

/// The callbacks registered on a reader.
#[derive(Clone, Default)]
pub struct Callbacks {
    pub on_tag: Option<TagCallback>,
    pub on_result: Option<ResultCallback>,
}

impl Callbacks {
    pub fn is_empty(&self) -> bool {
        self.on_tag.is_none() && self.on_result.is_none()
    }

    /// Dispatch `result` to every registered callback.
    ///
    /// Inside a tokio runtime each callback is spawned on the blocking pool
    /// and not awaited. Without one, callbacks run to completion before this
    /// returns.
    pub fn deliver(&self, result: DecodedResult) {
        let runtime = Handle::try_current().ok();

        if let Some(on_tag) = &self.on_tag {
            let on_tag = Arc::clone(on_tag);
            let tag = result.tag.clone();
            trace!(%tag, "Dispatching tag callback");
            dispatch(runtime.as_ref(), move || on_tag(tag));
        }

        if let Some(on_result) = &self.on_result {
            let on_result = Arc::clone(on_result);
            dispatch(runtime.as_ref(), move || on_result(result));
        }
    }
}

fn dispatch<F>(runtime: Option<&Handle>, job: F)
where
    F: FnOnce() + Send + 'static,
{
    match runtime {
        Some(handle) => drop(handle.spawn_blocking(job)),
        None => job(),
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_tag", &self.on_tag.is_some())
            .field("on_result", &self.on_result.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_deliver_to_both_callbacks() {
        let (tag_tx, mut tag_rx) = mpsc::unbounded_channel();
        let (result_tx, mut result_rx) = mpsc::unbounded_channel();

        let callbacks = Callbacks {
            on_tag: Some(Arc::new(move |tag| {
                let _ = tag_tx.send(tag);
            })),
            on_result: Some(Arc::new(move |result| {
                let _ = result_tx.send(result);
            })),
        };

        callbacks.deliver(DecodedResult::new("H10301", 26, 12, 21845));

        assert_eq!(tag_rx.recv().await.unwrap(), "21845");
        let result = result_rx.recv().await.unwrap();
        assert_eq!(result.site_code, "12");
        assert_eq!(result.bit_length, 26);
    }

    #[test]
    fn test_deliver_without_runtime_runs_inline() {
        let (tag_tx, tag_rx) = std::sync::mpsc::channel();
        let callbacks = Callbacks {
            on_tag: Some(Arc::new(move |tag| {
                let _ = tag_tx.send(tag);
            })),
            on_result: None,
        };

        callbacks.deliver(DecodedResult::new("H10301", 26, 1, 100));

        assert_eq!(tag_rx.try_recv().unwrap(), "100");
    }

    #[test]
    fn test_empty_callbacks() {
        let callbacks = Callbacks::default();
        assert!(callbacks.is_empty());
        assert_eq!(
            format!("{:?}", callbacks),
            "Callbacks { on_tag: false, on_result: false }"
        );
    }
}
