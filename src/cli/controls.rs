//! Keyboard and OS signal controls for the interactive session

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Commands the session loop reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Start or stop recording (Enter)
    Toggle,
    /// Play the audio feedback of the last report (`p`)
    Play,
    /// Leave the session (`q`, Ctrl+C, SIGTERM, end of input)
    Quit,
}

impl ControlSignal {
    /// Map one line of terminal input to a command
    pub fn from_line(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "" | "r" | "s" => Some(Self::Toggle),
            "p" | "play" => Some(Self::Play),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Control handler
///
/// Merges terminal lines and OS shutdown signals into one channel.
pub struct ControlHandler {
    receiver: mpsc::Receiver<ControlSignal>,
}

impl ControlHandler {
    /// Start listening on stdin and for shutdown signals.
    pub fn new() -> Result<Self, std::io::Error> {
        let (tx, rx) = mpsc::channel(10);

        spawn_signal_listeners(&tx)?;

        let tx_stdin = tx;
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match ControlSignal::from_line(&line) {
                        Some(signal) => {
                            if tx_stdin.send(signal).await.is_err() {
                                break;
                            }
                        }
                        None => debug!(input = %line.trim(), "ignoring unknown input"),
                    },
                    Ok(None) | Err(_) => {
                        let _ = tx_stdin.send(ControlSignal::Quit).await;
                        break;
                    }
                }
            }
        });

        Ok(Self { receiver: rx })
    }

    /// Wrap an existing channel (scripted sessions, tests)
    pub fn from_receiver(receiver: mpsc::Receiver<ControlSignal>) -> Self {
        Self { receiver }
    }

    /// Wait for the next command
    pub async fn recv(&mut self) -> Option<ControlSignal> {
        self.receiver.recv().await
    }

    /// Drop commands typed while the loop was busy.
    ///
    /// Returns true if one of them was Quit.
    pub fn discard_pending(&mut self) -> bool {
        let mut quit = false;
        while let Ok(signal) = self.receiver.try_recv() {
            debug!(?signal, "discarding input received while busy");
            quit |= signal == ControlSignal::Quit;
        }
        quit
    }
}

/// Shutdown-only listener for one-shot recordings
pub struct ShutdownSignal {
    receiver: mpsc::Receiver<ControlSignal>,
}

impl ShutdownSignal {
    pub fn new() -> Result<Self, std::io::Error> {
        let (tx, rx) = mpsc::channel(2);
        spawn_signal_listeners(&tx)?;
        Ok(Self { receiver: rx })
    }

    /// Resolves on the first Ctrl+C or SIGTERM
    pub async fn recv(&mut self) {
        let _ = self.receiver.recv().await;
    }
}

#[cfg(unix)]
fn spawn_signal_listeners(tx: &mpsc::Sender<ControlSignal>) -> Result<(), std::io::Error> {
    let tx_int = tx.clone();
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        while sigint.recv().await.is_some() {
            debug!("received SIGINT");
            if tx_int.send(ControlSignal::Quit).await.is_err() {
                break;
            }
        }
    });

    let tx_term = tx.clone();
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::spawn(async move {
        while sigterm.recv().await.is_some() {
            debug!("received SIGTERM");
            if tx_term.send(ControlSignal::Quit).await.is_err() {
                break;
            }
        }
    });

    Ok(())
}

#[cfg(not(unix))]
fn spawn_signal_listeners(tx: &mpsc::Sender<ControlSignal>) -> Result<(), std::io::Error> {
    let tx_int = tx.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            debug!("received Ctrl+C");
            if tx_int.send(ControlSignal::Quit).await.is_err() {
                break;
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_toggles() {
        assert_eq!(ControlSignal::from_line(""), Some(ControlSignal::Toggle));
        assert_eq!(ControlSignal::from_line("  \n"), Some(ControlSignal::Toggle));
        assert_eq!(ControlSignal::from_line("r"), Some(ControlSignal::Toggle));
    }

    #[test]
    fn play_and_quit() {
        assert_eq!(ControlSignal::from_line("p"), Some(ControlSignal::Play));
        assert_eq!(ControlSignal::from_line("P"), Some(ControlSignal::Play));
        assert_eq!(ControlSignal::from_line("q"), Some(ControlSignal::Quit));
        assert_eq!(ControlSignal::from_line("exit"), Some(ControlSignal::Quit));
    }

    #[test]
    fn unknown_input_is_ignored() {
        assert_eq!(ControlSignal::from_line("hello"), None);
    }

    #[tokio::test]
    async fn discard_pending_reports_quit() {
        let (tx, rx) = mpsc::channel(4);
        let mut controls = ControlHandler::from_receiver(rx);
        tx.send(ControlSignal::Toggle).await.unwrap();
        tx.send(ControlSignal::Quit).await.unwrap();

        assert!(controls.discard_pending());
        assert!(!controls.discard_pending());

        tx.send(ControlSignal::Play).await.unwrap();
        assert_eq!(controls.recv().await, Some(ControlSignal::Play));
    }
}
