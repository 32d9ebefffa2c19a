//! Terminal logging with colored module prefixes and progress bars.
//!
//! - `log!` prints one line per event: `[page] about.html`
//! - `ProgressBar` tracks the parallel asset stage
//!
//! # Example
//!
//! ```ignore
//! log!("page"; "{}", target.output_rel());
//!
//! if let Some(progress) = ProgressBar::start("assets", jobs.len()) {
//!     progress.inc();
//!     progress.finish();
//! }
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Whether a progress bar owns the last terminal line
static BAR_ACTIVE: AtomicBool = AtomicBool::new(false);

// ============================================================================
// Layout Constants
// ============================================================================
//
// Progress bar format: "[assets] [████░░░░] 42/100"
//                       ^------^ ^-------^ ^----^
//                       prefix   bar       count

const BRACKET_LEN: usize = 2;
const SPACE_AFTER_PREFIX: usize = 1;
const BAR_WRAPPER_LEN: usize = 3;
const SPACE_BEFORE_COUNT: usize = 1;
const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 40;

/// Display length of `[module] `.
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Falls back to 120 columns when there is no terminal (CI, pipes).
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix.
///
/// ```ignore
/// log!("tool"; "{} failed on {}", name, path.display());
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

// ============================================================================
// Progress Bar
// ============================================================================

/// One progress bar on the line below the log output.
///
/// Updates come from rayon workers, so drawing is serialized by a mutex.
pub struct ProgressBar {
    prefix: ColoredString,
    prefix_len: usize,
    total: usize,
    current: AtomicUsize,
    lock: Mutex<()>,
}

impl ProgressBar {
    /// Reserve a terminal line for `total` jobs, or `None` when there is at
    /// most one job and a bar would only flicker.
    pub fn start(name: &'static str, total: usize) -> Option<Self> {
        if total <= 1 {
            return None;
        }
        let mut stdout = stdout().lock();
        writeln!(stdout).ok();
        stdout.flush().ok();
        BAR_ACTIVE.store(true, Ordering::SeqCst);

        Some(Self {
            prefix: colorize_prefix(name, &name.to_ascii_lowercase()),
            prefix_len: calc_prefix_len(name.len()),
            total,
            current: AtomicUsize::new(0),
            lock: Mutex::new(()),
        })
    }

    pub fn inc(&self) {
        let current = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        let _guard = self.lock.lock().ok();

        let progress_text = format!("{}/{}", current, self.total);
        let bar = render_bar(current, self.total, self.prefix_len + progress_text.len());

        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveUp(1), Clear(ClearType::CurrentLine)).ok();
        writeln!(stdout, "{} [{}] {}", self.prefix, bar, progress_text).ok();
        stdout.flush().ok();
    }

    /// Clear the bar from the terminal.
    pub fn finish(&self) {
        if !BAR_ACTIVE.swap(false, Ordering::SeqCst) {
            return;
        }
        let _guard = self.lock.lock().ok();
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveUp(1), Clear(ClearType::CurrentLine)).ok();
        stdout.flush().ok();
    }
}

impl Drop for ProgressBar {
    fn drop(&mut self) {
        self.finish();
    }
}

/// `████░░░░` sized to what the terminal has left after `reserved` columns.
fn render_bar(current: usize, total: usize, reserved: usize) -> String {
    let width = get_terminal_width() as usize;
    let bar_width = width
        .saturating_sub(reserved + BAR_WRAPPER_LEN + SPACE_BEFORE_COUNT)
        .clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH);
    let filled = if total > 0 {
        (current.min(total) * bar_width) / total
    } else {
        0
    };
    "█".repeat(filled) + &"░".repeat(bar_width - filled)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Print `[module] message`, truncating single-line messages to the terminal width.
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);
    let width = get_terminal_width() as usize;

    let mut stdout = stdout().lock();

    let bar_active = BAR_ACTIVE.load(Ordering::SeqCst);
    if bar_active {
        execute!(stdout, cursor::MoveUp(1), Clear(ClearType::FromCursorDown)).ok();
    }

    if message.contains('\n') {
        // tool diagnostics span lines; never cut them
        writeln!(stdout, "{prefix} {message}").ok();
    } else {
        let max_msg_len = width.saturating_sub(calc_prefix_len(module.len()));
        writeln!(stdout, "{prefix} {}", truncate_str(message, max_msg_len)).ok();
    }

    if bar_active {
        // the bar is redrawn on its next update
        writeln!(stdout).ok();
    }

    stdout.flush().ok();
}

fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "error" => prefix.bright_red().bold(),
        "publish" | "clean" => prefix.bright_green().bold(),
        "final" | "page" | "template" => prefix.bright_blue().bold(),
        "warn" => prefix.bright_magenta().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate to at most `max_len` bytes on a char boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
