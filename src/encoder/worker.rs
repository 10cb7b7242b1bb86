use crate::error::EncodeError;
use smallvec::SmallVec;
use smol::channel::{Receiver, Sender};
use std::collections::BTreeMap;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// One frame waiting for palette quantisation
struct Job {
    index: usize,
    rgba: Vec<u8>,
    delay_cs: u16,
}

/// A quantised frame, tagged with its submission index
struct Quantized {
    index: usize,
    frame: gif::Frame<'static>,
}

/// Quantises frames on `workers` threads and streams them, reordered by
/// submission index, into a single GIF writer thread.
pub(super) struct QuantizePool {
    jobs: Option<Sender<Job>>,
    workers: SmallVec<[JoinHandle<()>; 4]>,
    writer: Option<JoinHandle<Result<Vec<u8>, EncodeError>>>,
    submitted: usize,
}

impl QuantizePool {
    pub(super) fn spawn(
        width: u16,
        height: u16,
        speed: i32,
        workers: usize,
    ) -> Result<Self, EncodeError> {
        let workers = workers.max(1);
        let (job_tx, job_rx) = smol::channel::bounded::<Job>(workers * 2);
        let (result_tx, result_rx) = smol::channel::bounded::<Quantized>(workers * 2);

        let writer = thread::Builder::new()
            .name("gif-writer".into())
            .spawn(move || write_frames(width, height, result_rx))
            .map_err(|e| EncodeError::new(format!("failed to spawn writer thread: {}", e)))?;

        let mut handles = SmallVec::new();
        for id in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("gif-quantize-{}", id))
                .spawn(move || quantize_frames(width, height, speed, job_rx, result_tx))
                .map_err(|e| EncodeError::new(format!("failed to spawn worker thread: {}", e)))?;
            handles.push(handle);
        }

        log::debug!("Started GIF encoder with {} quantize worker(s), speed {}", workers, speed);

        Ok(Self {
            jobs: Some(job_tx),
            workers: handles,
            writer: Some(writer),
            submitted: 0,
        })
    }

    /// Queue a frame. Blocks while the queue is full.
    pub(super) fn submit(&mut self, rgba: Vec<u8>, delay_cs: u16) -> Result<(), EncodeError> {
        let job = Job {
            index: self.submitted,
            rgba,
            delay_cs,
        };

        let sent = match &self.jobs {
            Some(jobs) => jobs.send_blocking(job).is_ok(),
            None => false,
        };

        if !sent {
            // Workers only go away when the writer failed; report its error.
            return Err(self.shutdown().err().unwrap_or_else(|| {
                EncodeError::new("encoder stopped before all frames were submitted")
            }));
        }

        self.submitted += 1;
        Ok(())
    }

    /// Close the queue, wait for every frame and return the GIF bytes.
    pub(super) fn finish(mut self) -> Result<Vec<u8>, EncodeError> {
        let submitted = self.submitted;
        let start = Instant::now();
        let bytes = self.shutdown()?;
        log::debug!(
            "GIF writer finished {} frame(s), {} bytes in {:?}",
            submitted,
            bytes.len(),
            start.elapsed()
        );
        Ok(bytes)
    }

    fn shutdown(&mut self) -> Result<Vec<u8>, EncodeError> {
        drop(self.jobs.take());

        let mut panicked = false;
        for handle in self.workers.drain(..) {
            panicked |= handle.join().is_err();
        }

        let written = match self.writer.take() {
            Some(writer) => writer
                .join()
                .map_err(|_| EncodeError::new("GIF writer thread panicked"))?,
            None => return Err(EncodeError::new("encoder already finished")),
        };

        if panicked {
            return Err(EncodeError::new("GIF quantize worker panicked"));
        }
        written
    }
}

impl Drop for QuantizePool {
    fn drop(&mut self) {
        if self.writer.is_some() {
            let _ = self.shutdown();
        }
    }
}

fn quantize_frames(
    width: u16,
    height: u16,
    speed: i32,
    jobs: Receiver<Job>,
    results: Sender<Quantized>,
) {
    while let Ok(mut job) = jobs.recv_blocking() {
        let mut frame = gif::Frame::from_rgba_speed(width, height, &mut job.rgba, speed);
        frame.delay = job.delay_cs;

        if results
            .send_blocking(Quantized {
                index: job.index,
                frame,
            })
            .is_err()
        {
            break;
        }
    }
}

fn write_frames(
    width: u16,
    height: u16,
    results: Receiver<Quantized>,
) -> Result<Vec<u8>, EncodeError> {
    let mut encoder = gif::Encoder::new(Vec::new(), width, height, &[])?;
    encoder.set_repeat(gif::Repeat::Infinite)?;

    let mut pending: BTreeMap<usize, gif::Frame<'static>> = BTreeMap::new();
    let mut next = 0usize;

    while let Ok(quantized) = results.recv_blocking() {
        pending.insert(quantized.index, quantized.frame);
        while let Some(frame) = pending.remove(&next) {
            encoder.write_frame(&frame)?;
            log::debug!("Wrote GIF frame {}", next);
            next += 1;
        }
    }

    if !pending.is_empty() {
        return Err(EncodeError::new(format!("frame {} never arrived", next)));
    }

    encoder
        .into_inner()
        .map_err(|e| EncodeError::new(format!("failed to write GIF trailer: {}", e)))
}
