//! Lookahead scheduler.
//!
//! The host calls [`Metronome::run_due`] from a coarse timer. Each poll
//! schedules every beat that falls inside the next [`SCHEDULE_AHEAD`] seconds
//! of audio-clock time, so late or skipped polls never drop or shift a beat:
//! `next_event_time` only ever advances from its own previous value.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::notify::{Beat, NotificationQueue};
use super::ramp::{Settings, TempoRamp};
use crate::audio::{AudioBackend, AudioError, ScheduledNote};
use crate::synth::SoundVariant;

/// Delay between `start` and the first beat, in audio-clock seconds
pub const LEAD_IN: f64 = 0.1;
/// Period of the scheduling poll
pub const LOOKAHEAD_INTERVAL: Duration = Duration::from_millis(25);
/// How far ahead of the audio clock beats are handed to the backend
pub const SCHEDULE_AHEAD: f64 = 0.1;
/// Floor for the tempo used to space beats
pub const MIN_TEMPO: f64 = 1.0;
/// Ceiling for the tempo used to space beats
pub const MAX_TEMPO: f64 = 400.0;

/// Position of the running metronome
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    /// Index of the next beat within its bar
    pub beat_index: usize,
    /// Bars completed since start
    pub bar_count: u64,
    /// Audio-clock time the next beat sounds at
    pub next_event_time: f64,
}

type BeatCallback = Box<dyn FnMut(Beat)>;
type TempoCallback = Box<dyn FnMut(f64)>;

/// Speed-trainer metronome driving an [`AudioBackend`]
pub struct Metronome<B: AudioBackend> {
    backend: B,
    settings: Settings,
    variant: SoundVariant,
    /// Present only while running
    cursor: Option<Cursor>,
    /// Armed poll; `None` when stopped
    next_poll: Option<Instant>,
    notifications: NotificationQueue,
    on_beat: Option<BeatCallback>,
    on_tempo_change: Option<TempoCallback>,
}

impl<B: AudioBackend> Metronome<B> {
    pub fn new(backend: B, settings: Settings) -> Self {
        Self {
            backend,
            settings,
            variant: SoundVariant::default(),
            cursor: None,
            next_poll: None,
            notifications: NotificationQueue::new(),
            on_beat: None,
            on_tempo_change: None,
        }
    }

    /// Replace all settings. Takes effect from the next scheduled beat.
    ///
    /// If the bar shrinks to or below the pending beat, that beat becomes the
    /// downbeat of a new bar and the shortened bar counts as completed.
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
        let beats_per_bar = self.beats_per_bar();
        if self
            .cursor
            .is_some_and(|cursor| cursor.beat_index >= beats_per_bar)
        {
            self.complete_bar();
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current tempo, including ramp steps taken so far
    pub fn tempo(&self) -> f64 {
        self.settings.tempo
    }

    pub fn set_sound_variant(&mut self, variant: SoundVariant) {
        self.variant = variant;
    }

    pub fn sound_variant(&self) -> SoundVariant {
        self.variant
    }

    /// Register the beat subscriber, replacing any previous one
    pub fn set_on_beat<F>(&mut self, callback: F)
    where
        F: FnMut(Beat) + 'static,
    {
        self.on_beat = Some(Box::new(callback));
    }

    /// Register the tempo-change subscriber, replacing any previous one
    pub fn set_on_tempo_change<F>(&mut self, callback: F)
    where
        F: FnMut(f64) + 'static,
    {
        self.on_tempo_change = Some(Box::new(callback));
    }

    pub fn is_running(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn position(&self) -> Option<Cursor> {
        self.cursor
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Beat notifications armed but not yet delivered
    pub fn pending_notifications(&self) -> usize {
        self.notifications.len()
    }

    /// Drop every armed beat notification
    pub fn cancel_notifications(&mut self) {
        self.notifications.clear();
    }

    /// Start playback. No-op while running.
    ///
    /// An audio backend that fails to resume is logged and otherwise ignored:
    /// the beat grid and notifications run on its clock regardless.
    pub fn start(&mut self, now: Instant) {
        if self.is_running() {
            return;
        }

        if let Err(e) = self.backend.resume() {
            warn!("starting without audio: {}", e);
        }

        self.cursor = Some(Cursor {
            beat_index: 0,
            bar_count: 0,
            next_event_time: self.backend.now() + LEAD_IN,
        });
        self.next_poll = Some(now);
        info!(
            tempo = self.settings.tempo,
            beats_per_bar = self.settings.beats_per_bar,
            sound = self.variant.name(),
            "metronome started"
        );
    }

    /// Stop playback. No-op while stopped.
    ///
    /// Notifications for beats already handed to the backend stay armed and
    /// are still delivered by [`Metronome::run_due`].
    pub fn stop(&mut self) {
        let Some(cursor) = self.cursor.take() else {
            return;
        };
        self.next_poll = None;
        info!(bars = cursor.bar_count, tempo = self.settings.tempo, "metronome stopped");
    }

    /// Earliest instant at which [`Metronome::run_due`] has work to do
    pub fn next_wakeup(&self) -> Option<Instant> {
        match (self.next_poll, self.notifications.next_due()) {
            (Some(poll), Some(beat)) => Some(poll.min(beat)),
            (poll, beat) => poll.or(beat),
        }
    }

    /// Run the poll if it is due, then deliver due beat notifications
    pub fn run_due(&mut self, now: Instant) {
        if self.next_poll.is_some_and(|due| due <= now) {
            self.poll(now);
            self.next_poll = Some(now + LOOKAHEAD_INTERVAL);
        }

        while let Some(beat) = self.notifications.pop_due(now) {
            if let Some(callback) = self.on_beat.as_mut() {
                callback(beat);
            }
        }
    }

    /// Schedule every beat inside the lookahead window
    fn poll(&mut self, now: Instant) {
        let audio_now = self.backend.now();
        let horizon = audio_now + SCHEDULE_AHEAD;

        while let Some(cursor) = self.cursor {
            if cursor.next_event_time >= horizon {
                break;
            }

            let beat = Beat {
                index: cursor.beat_index,
                time: cursor.next_event_time,
            };
            self.emit(beat);

            let delay = (beat.time - audio_now).max(0.0);
            self.notifications
                .push(now + Duration::from_secs_f64(delay), beat);

            self.advance();
        }
    }

    fn emit(&mut self, beat: Beat) {
        let note = ScheduledNote {
            variant: self.variant,
            beat_index: beat.index,
            accent: beat.is_accent(),
            time: beat.time,
        };
        match self.backend.schedule_note(note) {
            Ok(()) => {}
            // Expected for every beat while running without an output device
            Err(AudioError::NotRunning) => debug!(beat = beat.index, "no audio output, note skipped"),
            Err(e) => warn!(beat = beat.index, time = beat.time, "note dropped: {}", e),
        }
    }

    fn advance(&mut self) {
        // max/min rather than clamp: NaN falls back to MIN_TEMPO
        let interval = 60.0 / self.settings.tempo.max(MIN_TEMPO).min(MAX_TEMPO);
        let beats_per_bar = self.beats_per_bar();
        let Some(cursor) = self.cursor.as_mut() else {
            return;
        };

        cursor.next_event_time += interval;
        cursor.beat_index += 1;
        if cursor.beat_index >= beats_per_bar {
            self.complete_bar();
        }
    }

    fn complete_bar(&mut self) {
        let Some(cursor) = self.cursor.as_mut() else {
            return;
        };
        cursor.beat_index = 0;
        cursor.bar_count += 1;
        let bar_count = cursor.bar_count;

        let current = self.settings.tempo;
        if let Some(tempo) = TempoRamp::on_bar_completed(current, bar_count, &self.settings) {
            info!(bar = bar_count, from = current, to = tempo, "tempo ramp");
            self.settings.tempo = tempo;
            if let Some(callback) = self.on_tempo_change.as_mut() {
                callback(tempo);
            }
        }
    }

    fn beats_per_bar(&self) -> usize {
        self.settings.beats_per_bar.max(1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Backend with a hand-driven clock that records every note
    #[derive(Default)]
    struct FakeBackend {
        now: f64,
        notes: Vec<ScheduledNote>,
        resumes: usize,
        fail_resume: bool,
        fail_notes: bool,
    }

    impl AudioBackend for FakeBackend {
        fn resume(&mut self) -> Result<(), AudioError> {
            self.resumes += 1;
            if self.fail_resume {
                Err(AudioError::NoDevice)
            } else {
                Ok(())
            }
        }

        fn now(&self) -> f64 {
            self.now
        }

        fn schedule_note(&mut self, note: ScheduledNote) -> Result<(), AudioError> {
            if self.fail_notes {
                return Err(AudioError::BusFull);
            }
            self.notes.push(note);
            Ok(())
        }
    }

    fn settings(tempo: f64, beats_per_bar: u32, ramp_amount: u32, interval: u32, ceiling: f64) -> Settings {
        Settings {
            tempo,
            beats_per_bar,
            ramp_amount,
            ramp_interval_bars: interval,
            tempo_ceiling: ceiling,
        }
    }

    fn metronome(settings: Settings) -> Metronome<FakeBackend> {
        Metronome::new(FakeBackend::default(), settings)
    }

    /// Move both clocks to `t` seconds after `base` and let the host timer fire
    fn tick_at(m: &mut Metronome<FakeBackend>, base: Instant, t: f64) {
        m.backend_mut().now = t;
        m.run_due(base + Duration::from_secs_f64(t));
    }

    /// Fire the host timer at every given time
    fn drive(m: &mut Metronome<FakeBackend>, base: Instant, times: impl IntoIterator<Item = f64>) {
        for t in times {
            tick_at(m, base, t);
        }
    }

    fn regular_ticks(until: f64) -> impl Iterator<Item = f64> {
        let steps = (until / LOOKAHEAD_INTERVAL.as_secs_f64()).round() as usize;
        (0..=steps).map(|i| i as f64 * LOOKAHEAD_INTERVAL.as_secs_f64())
    }

    fn note_times(m: &Metronome<FakeBackend>, before: f64) -> Vec<f64> {
        m.backend()
            .notes
            .iter()
            .map(|n| n.time)
            .filter(|&t| t < before)
            .collect()
    }

    #[test]
    fn test_new_metronome_is_stopped() {
        let m = metronome(Settings::default());
        assert!(!m.is_running());
        assert_eq!(m.position(), None);
        assert_eq!(m.next_wakeup(), None);
        assert_eq!(m.sound_variant(), SoundVariant::Click);
    }

    #[test]
    fn test_start_seeds_cursor_after_lead_in() {
        let base = Instant::now();
        let mut m = metronome(Settings::default());
        m.backend_mut().now = 2.0;
        m.start(base);

        assert!(m.is_running());
        assert_eq!(m.backend().resumes, 1);
        assert_eq!(
            m.position(),
            Some(Cursor {
                beat_index: 0,
                bar_count: 0,
                next_event_time: 2.0 + LEAD_IN,
            })
        );
        assert_eq!(m.next_wakeup(), Some(base));
    }

    #[test]
    fn test_start_while_running_is_noop() {
        let base = Instant::now();
        let mut m = metronome(Settings::default());
        m.start(base);
        drive(&mut m, base, regular_ticks(1.0));
        let before = m.position();

        m.start(base + Duration::from_secs(1));
        assert_eq!(m.backend().resumes, 1);
        assert_eq!(m.position(), before);
    }

    #[test]
    fn test_stop_while_stopped_is_noop() {
        let mut m = metronome(Settings::default());
        m.stop();
        assert!(!m.is_running());
        assert_eq!(m.next_wakeup(), None);
    }

    #[test]
    fn test_beats_are_spaced_by_tempo() {
        let base = Instant::now();
        let mut m = metronome(settings(120.0, 4, 0, 1, 200.0));
        m.start(base);
        drive(&mut m, base, regular_ticks(5.0));

        let times = note_times(&m, 5.0);
        assert_eq!(times.len(), 10);
        assert!((times[0] - LEAD_IN).abs() < 1e-9);
        for pair in times.windows(2) {
            assert!((pair[1] - pair[0] - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_beat_index_cycles_without_skips() {
        let base = Instant::now();
        let mut m = metronome(settings(180.0, 3, 0, 1, 200.0));
        m.start(base);
        drive(&mut m, base, regular_ticks(10.0));

        let notes = &m.backend().notes;
        assert!(notes.len() > 20);
        for (i, note) in notes.iter().enumerate() {
            assert_eq!(note.beat_index, i % 3);
            assert_eq!(note.accent, i % 3 == 0);
        }
    }

    #[test]
    fn test_only_beats_inside_window_are_scheduled() {
        let base = Instant::now();
        let mut m = metronome(settings(120.0, 4, 0, 1, 200.0));
        m.start(base);

        // First beat sits exactly on the horizon: not yet inside the window
        tick_at(&mut m, base, 0.0);
        assert!(m.backend().notes.is_empty());

        tick_at(&mut m, base, 0.025);
        assert_eq!(m.backend().notes.len(), 1);
        for note in &m.backend().notes {
            assert!(note.time < 0.025 + SCHEDULE_AHEAD);
        }
    }

    #[test]
    fn test_poll_waits_for_lookahead_interval() {
        let base = Instant::now();
        let mut m = metronome(settings(120.0, 4, 0, 1, 200.0));
        m.start(base);
        tick_at(&mut m, base, 0.0);
        assert_eq!(m.next_poll, Some(base + LOOKAHEAD_INTERVAL));

        // Timer fires early: poll is not due, nothing is scheduled
        tick_at(&mut m, base, 0.010);
        assert!(m.backend().notes.is_empty());
        assert_eq!(m.next_poll, Some(base + LOOKAHEAD_INTERVAL));
    }

    #[test]
    fn test_sporadic_polling_matches_regular_polling() {
        let ramp = settings(120.0, 4, 10, 1, 180.0);

        let base = Instant::now();
        let mut regular = metronome(ramp.clone());
        regular.start(base);
        drive(&mut regular, base, regular_ticks(12.0));

        // Irregular timer: bursts, long stalls and skipped intervals
        let mut sporadic_times = Vec::new();
        let mut t = 0.0;
        let gaps = [0.025, 0.4, 0.01, 0.9, 0.3, 0.025, 0.025, 1.7, 0.05, 0.6];
        let mut i = 0;
        while t < 12.0 {
            sporadic_times.push(t);
            t += gaps[i % gaps.len()];
            i += 1;
        }
        sporadic_times.push(12.0);

        let mut sporadic = metronome(ramp);
        sporadic.start(base);
        drive(&mut sporadic, base, sporadic_times);

        let expected = note_times(&regular, 11.0);
        let actual = note_times(&sporadic, 11.0);
        assert!(expected.len() > 20);
        assert_eq!(actual, expected);

        let indices = |m: &Metronome<FakeBackend>| -> Vec<usize> {
            m.backend().notes.iter().filter(|n| n.time < 11.0).map(|n| n.beat_index).collect()
        };
        assert_eq!(indices(&sporadic), indices(&regular));
        assert!(sporadic.tempo() > 120.0);
    }

    #[test]
    fn test_ramp_changes_spacing_from_next_beat() {
        let base = Instant::now();
        // Tempo 60 -> 120 after the first bar of two beats
        let mut m = metronome(settings(60.0, 2, 60, 1, 120.0));
        m.start(base);
        drive(&mut m, base, regular_ticks(4.0));

        let times = note_times(&m, 4.0);
        assert!((times[1] - times[0] - 1.0).abs() < 1e-9);
        // Gap into the downbeat was computed before the ramp step
        assert!((times[2] - times[1] - 1.0).abs() < 1e-9);
        assert!((times[3] - times[2] - 0.5).abs() < 1e-9);
        assert_eq!(m.tempo(), 120.0);
    }

    #[test]
    fn test_speed_trainer_reaches_ceiling() {
        let base = Instant::now();
        let mut m = metronome(settings(80.0, 4, 5, 1, 200.0));
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        m.set_on_tempo_change(move |tempo| sink.borrow_mut().push(tempo));
        m.start(base);

        let mut t = 0.0;
        while m.position().map_or(0, |c| c.bar_count) < 40 {
            t += 0.5;
            tick_at(&mut m, base, t);
        }
        assert_eq!(m.tempo(), 200.0);
        assert_eq!(changes.borrow().len(), 24);
        assert_eq!(changes.borrow().last(), Some(&200.0));

        // Further bars: still at the ceiling, nothing reported
        let target = m.position().map_or(0, |c| c.bar_count) + 10;
        while m.position().map_or(0, |c| c.bar_count) < target {
            t += 0.5;
            tick_at(&mut m, base, t);
        }
        assert_eq!(m.tempo(), 200.0);
        assert_eq!(changes.borrow().len(), 24);
    }

    #[test]
    fn test_zero_ramp_keeps_tempo() {
        let base = Instant::now();
        let mut m = metronome(settings(80.0, 4, 0, 1, 200.0));
        let changes = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&changes);
        m.set_on_tempo_change(move |_| *sink.borrow_mut() += 1);
        m.start(base);

        drive(&mut m, base, (1..=120).map(|i| i as f64 * 0.5));
        assert!(m.position().map_or(0, |c| c.bar_count) >= 15);
        assert_eq!(m.tempo(), 80.0);
        assert_eq!(*changes.borrow(), 0);
    }

    #[test]
    fn test_tempo_change_fires_before_boundary_beat_notification() {
        let base = Instant::now();
        let mut m = metronome(settings(120.0, 2, 5, 1, 200.0));
        let log = Rc::new(RefCell::new(Vec::new()));
        let beats = Rc::clone(&log);
        m.set_on_beat(move |beat| beats.borrow_mut().push(format!("beat:{}", beat.index)));
        let tempos = Rc::clone(&log);
        m.set_on_tempo_change(move |tempo| tempos.borrow_mut().push(format!("tempo:{}", tempo)));
        m.start(base);

        // One late poll covers beats at 0.1 and 0.6 and the bar boundary after them
        tick_at(&mut m, base, 0.9);
        assert_eq!(*log.borrow(), vec!["tempo:125", "beat:0", "beat:1"]);
    }

    #[test]
    fn test_notifications_fire_when_beat_sounds() {
        let base = Instant::now();
        let mut m = metronome(settings(120.0, 4, 0, 1, 200.0));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        m.set_on_beat(move |beat| sink.borrow_mut().push(beat));
        m.start(base);

        tick_at(&mut m, base, 0.0);
        tick_at(&mut m, base, 0.025);
        // Beat 0 sounds at 0.1; its notification is armed but not yet due
        assert_eq!(m.pending_notifications(), 1);
        assert!(seen.borrow().is_empty());

        let due = m.next_wakeup().unwrap();
        assert!(due <= base + Duration::from_millis(50));

        m.run_due(base + Duration::from_millis(100));
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].index, 0);
        assert!((seen.borrow()[0].time - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_stop_keeps_armed_notifications() {
        let base = Instant::now();
        let mut m = metronome(settings(120.0, 4, 0, 1, 200.0));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        m.set_on_beat(move |beat| sink.borrow_mut().push(beat.index));
        m.start(base);

        tick_at(&mut m, base, 0.0);
        tick_at(&mut m, base, 0.025);
        m.stop();
        assert!(!m.is_running());
        assert_eq!(m.pending_notifications(), 1);

        // The beat emitted before stop still reaches the subscriber
        tick_at(&mut m, base, 0.2);
        assert_eq!(*seen.borrow(), vec![0]);
        assert_eq!(m.backend().notes.len(), 1);
        assert_eq!(m.next_wakeup(), None);
    }

    #[test]
    fn test_cancel_notifications_drops_pending_beats() {
        let base = Instant::now();
        let mut m = metronome(settings(120.0, 4, 0, 1, 200.0));
        let seen = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&seen);
        m.set_on_beat(move |_| *sink.borrow_mut() += 1);
        m.start(base);
        tick_at(&mut m, base, 0.0);
        tick_at(&mut m, base, 0.025);
        m.stop();
        m.cancel_notifications();

        tick_at(&mut m, base, 1.0);
        assert_eq!(*seen.borrow(), 0);
    }

    #[test]
    fn test_restart_resets_cursor() {
        let base = Instant::now();
        let mut m = metronome(settings(150.0, 3, 5, 1, 200.0));
        m.start(base);
        drive(&mut m, base, regular_ticks(6.0));
        assert!(m.position().unwrap().bar_count > 0);

        m.stop();
        m.backend_mut().now = 50.0;
        m.start(base + Duration::from_secs(50));
        assert_eq!(
            m.position(),
            Some(Cursor {
                beat_index: 0,
                bar_count: 0,
                next_event_time: 50.0 + LEAD_IN,
            })
        );
        assert_eq!(m.backend().resumes, 2);
    }

    #[test]
    fn test_settings_change_is_not_retroactive() {
        let base = Instant::now();
        let mut m = metronome(settings(120.0, 4, 0, 1, 200.0));
        m.start(base);
        tick_at(&mut m, base, 0.0);
        tick_at(&mut m, base, 0.025);
        // Beat 0 at 0.1 scheduled, beat 1 already placed at 0.6
        m.set_settings(settings(60.0, 4, 0, 1, 200.0));
        drive(&mut m, base, regular_ticks(3.0).skip(2));

        let times = note_times(&m, 3.0);
        assert!((times[1] - 0.6).abs() < 1e-9);
        assert!((times[2] - 1.6).abs() < 1e-9);
        assert!((times[3] - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_shrinking_bar_wraps_pending_beat() {
        let base = Instant::now();
        let mut m = metronome(settings(120.0, 4, 0, 1, 200.0));
        m.start(base);
        // Beats at 0.1, 0.6, 1.1 scheduled: next is index 3
        tick_at(&mut m, base, 1.05);
        assert_eq!(m.position().unwrap().beat_index, 3);

        m.set_settings(settings(120.0, 2, 0, 1, 200.0));
        let cursor = m.position().unwrap();
        assert_eq!(cursor.beat_index, 0);
        assert_eq!(cursor.bar_count, 1);

        drive(&mut m, base, [1.6, 2.1, 2.6]);
        let indices: Vec<usize> = m.backend().notes.iter().map(|n| n.beat_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 0, 1, 0]);
    }

    #[test]
    fn test_replacing_beat_callback() {
        let base = Instant::now();
        let mut m = metronome(settings(120.0, 4, 0, 1, 200.0));
        let first = Rc::new(RefCell::new(0usize));
        let second = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&first);
        m.set_on_beat(move |_| *sink.borrow_mut() += 1);
        let sink = Rc::clone(&second);
        m.set_on_beat(move |_| *sink.borrow_mut() += 1);

        m.start(base);
        drive(&mut m, base, regular_ticks(2.0));
        assert_eq!(*first.borrow(), 0);
        assert!(*second.borrow() >= 3);
    }

    #[test]
    fn test_sound_variant_applies_to_later_notes() {
        let base = Instant::now();
        let mut m = metronome(settings(120.0, 4, 0, 1, 200.0));
        m.set_sound_variant(SoundVariant::Cowbell);
        m.start(base);
        drive(&mut m, base, regular_ticks(1.0));
        let scheduled = m.backend().notes.len();

        m.set_sound_variant(SoundVariant::Woodblock);
        drive(&mut m, base, regular_ticks(3.0).skip(41));

        let notes = &m.backend().notes;
        assert!(notes.len() > scheduled);
        assert!(notes[..scheduled].iter().all(|n| n.variant == SoundVariant::Cowbell));
        assert!(notes[scheduled..].iter().all(|n| n.variant == SoundVariant::Woodblock));
    }

    #[test]
    fn test_emission_failure_does_not_stop_scheduling() {
        let base = Instant::now();
        let mut m = metronome(settings(120.0, 4, 0, 1, 200.0));
        m.backend_mut().fail_notes = true;
        let seen = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&seen);
        m.set_on_beat(move |_| *sink.borrow_mut() += 1);
        m.start(base);

        drive(&mut m, base, regular_ticks(3.0));
        assert!(m.is_running());
        assert!(m.backend().notes.is_empty());
        assert_eq!(m.position().unwrap().beat_index, 2);
        assert!(*seen.borrow() >= 5);
    }

    #[test]
    fn test_resume_failure_still_runs() {
        let base = Instant::now();
        let mut m = metronome(settings(120.0, 4, 0, 1, 200.0));
        m.backend_mut().fail_resume = true;
        let seen = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&seen);
        m.set_on_beat(move |_| *sink.borrow_mut() += 1);

        m.start(base);
        assert!(m.is_running());
        drive(&mut m, base, regular_ticks(2.0));
        assert!(*seen.borrow() >= 3);
    }

    #[test]
    fn test_degenerate_tempo_cannot_stall_poll() {
        let base = Instant::now();
        let mut m = metronome(settings(0.0, 4, 0, 1, 200.0));
        m.start(base);
        drive(&mut m, base, regular_ticks(0.5));
        // Spaced at MIN_TEMPO: one beat per minute
        assert_eq!(m.backend().notes.len(), 1);
        let next = m.position().unwrap().next_event_time;
        assert!((next - (LEAD_IN + 60.0 / MIN_TEMPO)).abs() < 1e-9);
    }

    #[test]
    fn test_huge_tempo_is_spaced_at_max_tempo() {
        for tempo in [1e20, f64::INFINITY, f64::MAX] {
            let base = Instant::now();
            let mut m = metronome(settings(tempo, 4, 0, 1, f64::INFINITY));
            m.start(base);
            drive(&mut m, base, regular_ticks(0.5));

            let times = note_times(&m, f64::INFINITY);
            assert_eq!(times.len(), 4, "tempo {}", tempo);
            for pair in times.windows(2) {
                assert!((pair[1] - pair[0] - 60.0 / MAX_TEMPO).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_nan_tempo_is_spaced_at_min_tempo() {
        let base = Instant::now();
        let mut m = metronome(settings(f64::NAN, 4, 0, 1, 200.0));
        m.start(base);
        drive(&mut m, base, regular_ticks(0.5));
        assert_eq!(m.backend().notes.len(), 1);
        let next = m.position().unwrap().next_event_time;
        assert!((next - (LEAD_IN + 60.0 / MIN_TEMPO)).abs() < 1e-9);
    }
}
