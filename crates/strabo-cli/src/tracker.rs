use serde::Serialize;
use strabo_core::{
    FrameInput, FrameOutput, IrisPipeline, PipelineConfig, PipelineError, WarningCounters,
};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("frame rejected: {0}")]
    Frame(#[from] PipelineError),
    #[error("failed to spawn tracker thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("tracker thread exited")]
    ChannelClosed,
}

/// State of one track after its last frame.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerSummary {
    pub frames_processed: u64,
    pub baseline_captured: bool,
    pub counters: WarningCounters,
}

/// Messages sent from the replay loop to a tracker thread.
enum TrackerRequest {
    Process {
        frame: Box<FrameInput>,
        reply: oneshot::Sender<Result<FrameOutput, PipelineError>>,
    },
    Summary {
        reply: oneshot::Sender<TrackerSummary>,
    },
}

/// Clone-safe handle to a tracker thread.
#[derive(Clone)]
pub struct TrackerHandle {
    tx: mpsc::Sender<TrackerRequest>,
}

impl TrackerHandle {
    /// Run one frame through this track's pipeline.
    pub async fn process(&self, frame: FrameInput) -> Result<FrameOutput, TrackerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(TrackerRequest::Process {
                frame: Box::new(frame),
                reply: reply_tx,
            })
            .await
            .map_err(|_| TrackerError::ChannelClosed)?;
        let result = reply_rx.await.map_err(|_| TrackerError::ChannelClosed)?;
        Ok(result?)
    }

    pub async fn summary(&self) -> Result<TrackerSummary, TrackerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(TrackerRequest::Summary { reply: reply_tx })
            .await
            .map_err(|_| TrackerError::ChannelClosed)?;
        reply_rx.await.map_err(|_| TrackerError::ChannelClosed)
    }
}

/// Spawn a pipeline instance on a dedicated OS thread.
///
/// The pipeline never leaves its thread, so frames for one track are applied
/// strictly in the order they were sent. The thread exits once every handle
/// has been dropped.
pub fn spawn_tracker(track: &str, config: PipelineConfig) -> Result<TrackerHandle, TrackerError> {
    let (tx, mut rx) = mpsc::channel::<TrackerRequest>(16);
    let track_name = track.to_string();

    std::thread::Builder::new()
        .name(format!("strabo-{track}"))
        .spawn(move || {
            let mut pipeline = IrisPipeline::new(config);
            tracing::info!(track = %track_name, "tracker thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    TrackerRequest::Process { frame, reply } => {
                        let _ = reply.send(pipeline.process(&frame));
                    }
                    TrackerRequest::Summary { reply } => {
                        let detector = pipeline.detector();
                        let _ = reply.send(TrackerSummary {
                            frames_processed: pipeline.frames_processed(),
                            baseline_captured: detector.baseline().is_some(),
                            counters: *detector.counters(),
                        });
                    }
                }
            }
            tracing::info!(
                track = %track_name,
                frames = pipeline.frames_processed(),
                "tracker thread exiting"
            );
        })
        .map_err(TrackerError::Spawn)?;

    Ok(TrackerHandle { tx })
}
