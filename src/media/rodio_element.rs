use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::element::{MediaElement, MediaEventSender};
use super::{MediaEvent, MediaEventKind, MediaSource, ObjectUrl, ReadyState};
use crate::error::MediaError;

/// Media element playing through the default output device.
///
/// Sources are fully in memory, so a bound source is immediately ready.
pub struct RodioElement {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Option<Sink>,
    source: Option<ObjectUrl>,
    events: MediaEventSender,
    volume: f32,
    ended: bool,
}

impl RodioElement {
    pub fn new(events: MediaEventSender) -> Result<Self, MediaError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| MediaError::Output(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
            source: None,
            events,
            volume: 1.0,
            ended: false,
        })
    }

    fn emit(&self, kind: MediaEventKind) {
        if let Some(source) = &self.source {
            let _ = self.events.send(MediaEvent {
                source: source.clone(),
                kind,
            });
        }
    }

    fn detach(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.source = None;
        self.ended = false;
    }
}

impl MediaElement for RodioElement {
    fn set_source(&mut self, source: Option<&MediaSource>) -> Result<(), MediaError> {
        self.detach();
        let Some(source) = source else {
            return Ok(());
        };

        let reader = Cursor::new(Arc::clone(source.bytes()));
        let decoder = Decoder::new(reader).map_err(|e| MediaError::Decode(e.to_string()))?;
        let total = decoder.total_duration();

        let sink = Sink::try_new(&self.stream_handle).map_err(|e| MediaError::Output(e.to_string()))?;
        sink.pause();
        sink.set_volume(self.volume);
        sink.append(decoder);

        debug!("Bound {} ({})", source.url(), source.content_type());
        self.sink = Some(sink);
        self.source = Some(source.url().clone());

        if let Some(total) = total {
            self.emit(MediaEventKind::DurationChange(total));
        }
        self.emit(MediaEventKind::CanPlay);
        Ok(())
    }

    fn play(&mut self) -> Result<(), MediaError> {
        let sink = self.sink.as_ref().ok_or(MediaError::NoSource)?;
        if sink.is_paused() {
            sink.play();
            self.ended = false;
            self.emit(MediaEventKind::Playing);
        }
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            if !sink.is_paused() {
                sink.pause();
                self.emit(MediaEventKind::Paused);
            }
        }
    }

    fn seek(&mut self, position: Duration) {
        let Some(sink) = &self.sink else {
            return;
        };
        match sink.try_seek(position) {
            Ok(()) => self.emit(MediaEventKind::TimeUpdate(position)),
            Err(e) => warn!("Seek to {:?} failed: {}", position, e),
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(sink) = &self.sink {
            sink.set_volume(volume);
        }
    }

    fn ready_state(&self) -> ReadyState {
        if self.sink.is_some() {
            ReadyState::HaveEnoughData
        } else {
            ReadyState::HaveNothing
        }
    }

    fn poll(&mut self) {
        let Some(sink) = &self.sink else {
            return;
        };
        if sink.is_paused() || self.ended {
            return;
        }
        if sink.empty() {
            self.ended = true;
            sink.pause();
            self.emit(MediaEventKind::Ended);
        } else {
            self.emit(MediaEventKind::TimeUpdate(sink.get_pos()));
        }
    }
}
