//! Animated spinner shown on stderr while a model-bound phase is in flight.

use crossterm::{
    cursor::{Hide, MoveToColumn, Show},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::future::Future;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use tokio::sync::oneshot;

/// Spinner animation frames - braille pattern spinner
pub const SPINNER_BRAILLE: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Spinner animation frames - circular
pub const SPINNER_CIRCLE: [char; 4] = ['◐', '◓', '◑', '◒'];

const FRAME_DURATION: Duration = Duration::from_millis(80);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpinnerStyle {
    Braille,
    Circle,
}

/// A single-line console spinner
pub struct Spinner {
    frames: Vec<char>,
    current_frame: usize,
    message: String,
}

impl Spinner {
    pub fn new(style: SpinnerStyle) -> Self {
        let frames = match style {
            SpinnerStyle::Braille => SPINNER_BRAILLE.to_vec(),
            SpinnerStyle::Circle => SPINNER_CIRCLE.to_vec(),
        };
        Self {
            frames,
            current_frame: 0,
            message: String::new(),
        }
    }

    pub fn with_message(mut self, msg: &str) -> Self {
        self.message = msg.to_string();
        self
    }

    /// Start the spinner (hides cursor)
    pub fn start(&self) {
        let _ = execute!(io::stderr(), Hide);
        self.render();
    }

    /// Stop the spinner (shows cursor, clears line)
    pub fn stop(&self) {
        let _ = execute!(
            io::stderr(),
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Show
        );
    }

    /// Move to the next frame and redraw
    pub fn tick(&mut self) {
        self.advance();
        self.render();
    }

    fn advance(&mut self) {
        self.current_frame = (self.current_frame + 1) % self.frames.len();
    }

    fn frame(&self) -> char {
        self.frames[self.current_frame]
    }

    fn render(&self) {
        let _ = execute!(
            io::stderr(),
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Rgb { r: 140, g: 140, b: 140 }),
            Print(format!("  {} ", self.frame())),
            SetForegroundColor(Color::Rgb { r: 180, g: 180, b: 180 }),
            Print(&self.message),
            ResetColor
        );
        let _ = io::stderr().flush();
    }
}

/// Await `fut` while a spinner with `message` animates on stderr.
///
/// Falls through to a plain await when stderr is not a terminal.
pub async fn spin_while<F: Future>(message: &str, fut: F) -> F::Output {
    if !io::stderr().is_terminal() {
        return fut.await;
    }

    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let mut spinner = Spinner::new(SpinnerStyle::Braille).with_message(message);
    let handle = tokio::spawn(async move {
        spinner.start();
        let mut interval = tokio::time::interval(FRAME_DURATION);
        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                _ = interval.tick() => spinner.tick(),
            }
        }
        spinner.stop();
    });

    let output = fut.await;
    let _ = stop_tx.send(());
    let _ = handle.await;
    output
}
