#![allow(dead_code)]

use cosmic::app::Settings;
use cosmic::cosmic_config::CosmicConfigEntry;
use cosmic::iced::Limits;

mod application;
mod message;
mod pages;

use quicknote::config::{QuickNoteConfig, CONFIG_VERSION};

use application::{Flags, QuickNote};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cosmic_cfg = cosmic::cosmic_config::Config::new("dev.quicknote.app", CONFIG_VERSION)
        .expect("Failed to create cosmic config");
    let config = QuickNoteConfig::get_entry(&cosmic_cfg).unwrap_or_else(|(_, cfg)| cfg);

    // Set up logging to the systemd user journal (`journalctl --user -t quicknote -f`).
    // Wrapper filters: quicknote crates at info/debug (per config), everything else at warn.
    {
        struct FilteredJournal {
            inner: systemd_journal_logger::JournalLog,
        }

        impl log::Log for FilteredJournal {
            fn enabled(&self, metadata: &log::Metadata) -> bool {
                let target = metadata.target();
                if target.starts_with("quicknote")
                    || target.starts_with("application")
                    || target.starts_with("pages")
                {
                    let max = if quicknote::debug_logging() {
                        log::LevelFilter::Debug
                    } else {
                        log::LevelFilter::Info
                    };
                    metadata.level() <= max
                } else {
                    metadata.level() <= log::LevelFilter::Warn
                }
            }
            fn log(&self, record: &log::Record) {
                if self.enabled(record.metadata()) {
                    self.inner.log(record);
                }
            }
            fn flush(&self) {
                self.inner.flush();
            }
        }

        let journal = systemd_journal_logger::JournalLog::new()
            .unwrap()
            .with_syslog_identifier("quicknote".to_string());

        quicknote::set_debug_logging(config.debug_logging);

        log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).unwrap();
        // Global max must be Debug so quicknote debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }

    let mut settings = Settings::default();
    settings = settings.size_limits(Limits::NONE.min_width(400.0).min_height(300.0));

    let flags = Flags {
        config,
        cosmic_config: cosmic_cfg,
    };
    cosmic::app::run::<QuickNote>(settings, flags)?;

    Ok(())
}
