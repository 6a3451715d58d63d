use colored::Colorize;
use indicatif::{
    HumanBytes, MultiProgress, ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle,
};
use std::{fmt::Write, time::Duration};

use crate::progress::{DownloadProgressUpdater, LogType, ProgressListener};

const PROGRESS_CHARS: &str = "━━";

struct BarTemplates {
    pub main: &'static str,
    pub download: &'static str,
}

impl Default for BarTemplates {
    fn default() -> Self {
        Self {
            main: "{spinner:.green.bold} {elapsed_precise:.bold} {wide_bar:.green/white.dim} {percent:.bold}  {pos:.green} (eta. {eta:.blue})",
            download: "{spinner:.green.bold} {bar:40.green/white.dim} {percent:.bold} | {byte_progress:21.green} @ {bytes_per_sec:>13.red} (eta. {eta:<4.blue})",
        }
    }
}

/// Terminal progress display built on `indicatif`.
#[derive(Debug)]
pub struct IndicatifProgressHandler {
    main_bar: ProgressBar,
    multi_pb: MultiProgress,
}

impl IndicatifProgressHandler {
    pub fn new(initial_len: u64) -> Self {
        let template = BarTemplates::default();
        let bar = ProgressBar::new(initial_len).with_style(master_progress_style(&template));
        bar.set_draw_target(ProgressDrawTarget::stderr());
        bar.enable_steady_tick(Duration::from_millis(100));

        let multi = MultiProgress::new();
        let main = multi.add(bar);

        Self {
            main_bar: main,
            multi_pb: multi,
        }
    }
}

impl Default for IndicatifProgressHandler {
    fn default() -> Self {
        Self::new(0)
    }
}

#[derive(Debug)]
struct IndicatifDownloadProgressUpdater {
    bar: ProgressBar,
}

impl DownloadProgressUpdater for IndicatifDownloadProgressUpdater {
    fn set_progress(&self, bytes_downloaded: u64) {
        self.bar.set_position(bytes_downloaded);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressListener for IndicatifProgressHandler {
    fn set_main_total(&self, total: u64) {
        self.main_bar.set_length(total);
    }

    fn main_tick(&self) {
        self.main_bar.inc(1);
    }

    fn main_done(&self) {
        self.main_bar.finish_and_clear();
    }

    fn add_download_task(
        &self,
        name: String,
        total_size: Option<u64>,
    ) -> Box<dyn DownloadProgressUpdater> {
        let style = download_progress_style(&BarTemplates::default());

        let pb = ProgressBar::new(total_size.unwrap_or(0))
            .with_style(style)
            .with_message(name);
        pb.set_draw_target(ProgressDrawTarget::stderr());

        let managed_pb = self.multi_pb.add(pb);

        Box::new(IndicatifDownloadProgressUpdater { bar: managed_pb })
    }

    fn log_event(&self, log_type: LogType, target: &str, message: &str) {
        let formatted_message = match log_type {
            LogType::Info => format!("{} {}", target.bold(), message),
            LogType::Success => format!("{} {}", target.blue().italic(), message.green().bold()),
            LogType::Warning => format!(
                "{} {} {}",
                target.blue().italic(),
                message.yellow().bold(),
                "Skipping...".yellow().bold()
            ),
            LogType::Error => format!(
                "{} {} {}",
                target.blue().italic(),
                message.red().bold(),
                "Error.".red().bold()
            ),
        };

        self.main_bar.println(formatted_message);
    }
}

fn master_progress_style(templates: &BarTemplates) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(templates.main)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("pos", |state: &ProgressState, w: &mut dyn Write| {
            let _ = write!(w, "{}/{}", state.pos(), state.len().unwrap_or(0));
        })
        .with_key("percent", |state: &ProgressState, w: &mut dyn Write| {
            let _ = write!(w, "{:>3.0}%", state.fraction() * 100_f32);
        })
        .progress_chars(PROGRESS_CHARS)
}

fn download_progress_style(templates: &BarTemplates) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(templates.download)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("percent", |state: &ProgressState, w: &mut dyn Write| {
            let _ = write!(w, "{:>3.0}%", state.fraction() * 100_f32);
        })
        .with_key(
            "byte_progress",
            |state: &ProgressState, w: &mut dyn Write| {
                let _ = write!(
                    w,
                    "{}/{}",
                    HumanBytes(state.pos()),
                    HumanBytes(state.len().unwrap_or(0))
                );
            },
        )
        .progress_chars(PROGRESS_CHARS)
}
