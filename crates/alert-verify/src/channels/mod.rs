//! Verifiers of each notification channel.
mod console;
mod email;
mod event_viewer;
mod log_window;
mod rss;
mod save_to_disk;

pub use console::ConsoleVerifier;
pub use email::EmailVerifier;
pub use event_viewer::EventViewerVerifier;
pub use log_window::{tail_window, LogWindowVerifier};
pub use rss::RssVerifier;
pub use save_to_disk::SaveToDiskVerifier;

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::RemoteMachine;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Scripted responses of a method. The final response repeats.
    pub struct Script<T: Clone>(Mutex<VecDeque<Result<T, String>>>);

    impl<T: Clone> Script<T> {
        pub fn new(responses: Vec<Result<T, String>>) -> Self {
            Self(Mutex::new(responses.into()))
        }

        pub fn next(&self) -> anyhow::Result<T> {
            let mut responses = self.0.lock().unwrap();
            let response = if responses.len() > 1 {
                responses.pop_front()
            } else {
                responses.front().cloned()
            };
            response
                .expect("script is not empty")
                .map_err(|err| anyhow::anyhow!(err))
        }
    }

    /// RemoteMachine with scripted folder listings and command output, and
    /// fixed file contents.
    pub struct FakeMachine {
        pub latest: Script<Option<String>>,
        pub files: HashMap<String, Vec<String>>,
        pub contents: HashMap<String, String>,
        pub command: Script<String>,
        pub requests: Mutex<Vec<String>>,
    }

    impl Default for FakeMachine {
        fn default() -> Self {
            Self {
                latest: Script::new(vec![Ok(None)]),
                files: HashMap::new(),
                contents: HashMap::new(),
                command: Script::new(vec![Ok(String::new())]),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl FakeMachine {
        fn record(&self, request: String) {
            self.requests.lock().unwrap().push(request);
        }
    }

    #[async_trait::async_trait]
    impl RemoteMachine for FakeMachine {
        async fn latest_timestamped_entry(&self, folder: &str) -> anyhow::Result<Option<String>> {
            self.record(format!("latest {folder}"));
            self.latest.next()
        }
        async fn list_files(&self, folder: &str) -> anyhow::Result<Vec<String>> {
            self.record(format!("list {folder}"));
            Ok(self.files.get(folder).cloned().unwrap_or_default())
        }
        async fn read_file(&self, path: &str) -> anyhow::Result<String> {
            self.record(format!("read {path}"));
            self.contents
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("{path} not found"))
        }
        async fn run_command(&self, command: &str) -> anyhow::Result<String> {
            self.record(format!("run {command}"));
            self.command.next()
        }
    }
}
