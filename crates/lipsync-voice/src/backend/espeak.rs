//! `espeak-ng` speech service.
//!
//! Every utterance runs one `espeak-ng --stdin` child process that plays
//! straight to the default audio device. Start is reported once the text has
//! been written to the child, end when it exits successfully. Cancelling
//! kills the child.
//!
//! The binary is found via `ESPEAK_BIN`, then `espeak-ng`, then `espeak` on
//! `PATH`.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Weak};

use lipsync_core::{
    SpeechError, SpeechSynthesisPort, UtteranceCallbacks, UtteranceRequest, Voice,
    VoicesChangedCallback,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use super::PlaybackSlot;
use crate::error::{VoiceError, current_runtime};

/// Environment variable overriding binary discovery.
pub const ESPEAK_BIN_ENV: &str = "ESPEAK_BIN";

/// Words per minute at rate 1.0.
const BASE_WPM: f32 = 160.0;

/// Configuration for [`EspeakSpeechService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EspeakConfig {
    /// Path to the `espeak-ng` (or `espeak`) binary.
    pub binary: PathBuf,
}

impl EspeakConfig {
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Locate an installed binary.
    #[must_use]
    pub fn detect() -> Option<Self> {
        let binary = std::env::var_os(ESPEAK_BIN_ENV)
            .and_then(|value| resolve_override(&value))
            .or_else(|| find_in(std::env::var_os("PATH")))?;
        tracing::info!(binary = %binary.display(), "Detected espeak binary");
        Some(Self { binary })
    }
}

/// Binary names tried on `PATH`, in order.
const BINARY_CANDIDATES: [&str; 2] = ["espeak-ng", "espeak"];

/// Resolve an `ESPEAK_BIN` value to an executable.
fn resolve_override(value: &OsStr) -> Option<PathBuf> {
    match which::which(value) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!(
                value = %value.to_string_lossy(),
                error = %e,
                "{ESPEAK_BIN_ENV} is not an executable, searching PATH"
            );
            None
        }
    }
}

/// First executable candidate in `paths`.
fn find_in(paths: Option<OsString>) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    BINARY_CANDIDATES
        .iter()
        .find_map(|candidate| which::which_in(candidate, paths.as_ref(), &cwd).ok())
}

/// Command-line arguments for one utterance, excluding `--stdin`.
#[must_use]
pub fn command_args(request: &UtteranceRequest) -> Vec<String> {
    #[allow(clippy::cast_possible_truncation)]
    let wpm = (BASE_WPM * request.rate).round().clamp(80.0, 450.0) as i32;
    #[allow(clippy::cast_possible_truncation)]
    let pitch = (50.0 * request.pitch).round().clamp(0.0, 99.0) as i32;
    #[allow(clippy::cast_possible_truncation)]
    let amplitude = (100.0 * request.volume).round().clamp(0.0, 200.0) as i32;

    let mut args = vec![
        "-s".to_string(),
        wpm.to_string(),
        "-p".to_string(),
        pitch.to_string(),
        "-a".to_string(),
        amplitude.to_string(),
    ];
    if let Some(voice) = &request.voice {
        args.push("-v".to_string());
        args.push(voice.id.clone());
    }
    args
}

/// Parse the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US            (en 5)
/// ```
#[must_use]
pub fn parse_voice_list(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("Pty"))
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [_, language, _, name, ..] = fields.as_slice() else {
                return None;
            };
            let voice = Voice::new(*language, name.replace('_', " "), normalise_locale(language));
            Some(if *language == "en" {
                voice.as_default()
            } else {
                voice
            })
        })
        .collect()
}

/// `en-us` → `en-US`; the language subtag stays lower case.
fn normalise_locale(language: &str) -> String {
    let mut parts = language.split('-');
    let mut locale = parts.next().unwrap_or_default().to_ascii_lowercase();
    for part in parts {
        locale.push('-');
        if part.len() == 2 {
            locale.push_str(&part.to_ascii_uppercase());
        } else {
            locale.push_str(part);
        }
    }
    locale
}

fn query_voices(binary: &Path) -> Result<Vec<Voice>, SpeechError> {
    let output = std::process::Command::new(binary)
        .arg("--voices")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()?;
    if !output.status.success() {
        return Err(SpeechError::Unavailable(format!(
            "{} --voices exited with {}",
            binary.display(),
            output.status
        )));
    }
    Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
}

struct EspeakInner {
    config: EspeakConfig,
    runtime: Handle,
    playback: PlaybackSlot,
    voices: Vec<Voice>,
}

/// Speech service backed by the `espeak-ng` command-line tool.
#[derive(Clone)]
pub struct EspeakSpeechService {
    inner: Arc<EspeakInner>,
}

impl EspeakSpeechService {
    /// Create a service, querying the voice list once.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(config: EspeakConfig) -> Result<Self, VoiceError> {
        let runtime = current_runtime()?;
        let voices = query_voices(&config.binary)
            .map_err(|e| VoiceError::BackendUnavailable(e.to_string()))?;
        tracing::debug!(count = voices.len(), "espeak voices loaded");
        Ok(Self {
            inner: Arc::new(EspeakInner {
                config,
                runtime,
                playback: PlaybackSlot::default(),
                voices,
            }),
        })
    }

    /// Detect a binary and create a service for it.
    pub fn detect() -> Result<Self, VoiceError> {
        let config = EspeakConfig::detect().ok_or_else(|| {
            VoiceError::BackendUnavailable("espeak-ng not found on PATH".to_string())
        })?;
        Self::new(config)
    }

    #[must_use]
    pub fn config(&self) -> &EspeakConfig {
        &self.inner.config
    }
}

impl SpeechSynthesisPort for EspeakSpeechService {
    fn speak(
        &self,
        request: UtteranceRequest,
        callbacks: UtteranceCallbacks,
    ) -> Result<(), SpeechError> {
        let mut command = Command::new(&self.inner.config.binary);
        command
            .args(command_args(&request))
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        tracing::debug!(utterance_id = %request.id, command = ?command, "Running espeak");

        let child = {
            let _guard = self.inner.runtime.enter();
            command.spawn()?
        };
        let token = self.inner.playback.begin(request.id);

        self.inner.runtime.spawn(drive(
            Arc::downgrade(&self.inner),
            child,
            request.text,
            callbacks,
            token,
        ));
        Ok(())
    }

    fn cancel(&self) {
        if let Some(id) = self.inner.playback.cancel() {
            tracing::debug!(utterance_id = %id, "espeak utterance cancelled");
        }
    }

    fn voices(&self) -> Vec<Voice> {
        self.inner.voices.clone()
    }

    // The installed voice set does not change while running.
    fn subscribe_voices_changed(&self, _callback: VoicesChangedCallback) {}
}

async fn drive(
    inner: Weak<EspeakInner>,
    mut child: Child,
    text: String,
    callbacks: UtteranceCallbacks,
    token: CancellationToken,
) {
    if let Some(mut stdin) = child.stdin.take() {
        let written = async {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await
        }
        .await;
        if let Err(e) = written {
            // Killing an already-exited child is fine.
            let _ = child.kill().await;
            release(&inner, &callbacks);
            callbacks.failed(SpeechError::Io(e));
            return;
        }
    }

    if token.is_cancelled() {
        let _ = child.kill().await;
        callbacks.failed(SpeechError::Interrupted);
        return;
    }
    callbacks.started();

    let status = tokio::select! {
        biased;
        () = token.cancelled() => {
            let _ = child.kill().await;
            callbacks.failed(SpeechError::Interrupted);
            return;
        }
        status = child.wait() => status,
    };

    if !release(&inner, &callbacks) {
        return;
    }
    match status {
        Ok(status) if status.success() => callbacks.ended(),
        Ok(status) => {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr).await;
            }
            let detail = stderr.trim();
            let message = if detail.is_empty() {
                format!("espeak exited with {status}")
            } else {
                format!("espeak exited with {status}: {detail}")
            };
            callbacks.failed(SpeechError::Synthesis(message));
        }
        Err(e) => callbacks.failed(SpeechError::Io(e)),
    }
}

/// Release the playback slot. `false` if the utterance was already superseded.
fn release(inner: &Weak<EspeakInner>, callbacks: &UtteranceCallbacks) -> bool {
    inner
        .upgrade()
        .is_some_and(|inner| inner.playback.finish(callbacks.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lipsync_core::UtteranceId;

    fn request(rate: f32, pitch: f32, volume: f32, voice: Option<Voice>) -> UtteranceRequest {
        UtteranceRequest {
            id: UtteranceId::allocate(),
            text: "Hi".to_string(),
            rate,
            pitch,
            volume,
            voice,
        }
    }

    #[test]
    fn args_map_playback_parameters() {
        let args = command_args(&request(0.9, 1.1, 1.0, None));
        assert_eq!(args, vec!["-s", "144", "-p", "55", "-a", "100"]);
    }

    #[test]
    fn args_are_clamped_and_include_voice() {
        let voice = Voice::new("en-us", "English (America)", "en-US");
        let args = command_args(&request(10.0, 2.0, 0.0, Some(voice)));
        assert_eq!(args, vec!["-s", "450", "-p", "99", "-a", "0", "-v", "en-us"]);

        let slow = command_args(&request(0.1, 0.0, 1.0, None));
        assert_eq!(&slow[..4], &["-s", "80", "-p", "0"]);
    }

    #[test]
    fn parses_voice_table() {
        let output = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  en              --/M      English_(Great_Britain) gmw/en          (en-gb 2)
 2  en-us           --/M      English_(America)  gmw/en-US            (en 3)
 5  zh-yue          --/M      Chinese_(Cantonese) sit/yue
";
        let voices = parse_voice_list(output);
        assert_eq!(voices.len(), 4);

        assert_eq!(voices[0].id, "af");
        assert_eq!(voices[0].locale, "af");
        assert!(!voices[0].is_default);

        assert!(voices[1].is_default);
        assert_eq!(voices[1].name, "English (Great Britain)");

        assert_eq!(voices[2].locale, "en-US");
        assert_eq!(voices[2].name, "English (America)");

        assert_eq!(voices[3].locale, "zh-yue");
    }

    #[test]
    fn blank_or_headerless_output_yields_nothing() {
        assert!(parse_voice_list("").is_empty());
        assert!(parse_voice_list(" 5  af  --/M  Afrikaans  gmw/af").is_empty());
    }

    #[test]
    fn locale_normalisation() {
        assert_eq!(normalise_locale("en-us"), "en-US");
        assert_eq!(normalise_locale("EN"), "en");
        assert_eq!(normalise_locale("pt-br"), "pt-BR");
    }

    // ── Binary discovery ───────────────────────────────────────────

    #[cfg(unix)]
    fn install(dir: &Path, name: &str, mode: u32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn discovery_skips_non_executable_files() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        install(first.path(), "espeak-ng", 0o644);
        let espeak = install(second.path(), "espeak", 0o755);

        let paths = std::env::join_paths([first.path(), second.path()]).unwrap();
        assert_eq!(find_in(Some(paths)), Some(espeak));
    }

    #[cfg(unix)]
    #[test]
    fn discovery_prefers_espeak_ng() {
        let dir = tempfile::tempdir().unwrap();
        let espeak_ng = install(dir.path(), "espeak-ng", 0o755);
        install(dir.path(), "espeak", 0o755);

        let paths = std::env::join_paths([dir.path()]).unwrap();
        assert_eq!(find_in(Some(paths)), Some(espeak_ng));
    }

    #[test]
    fn discovery_on_empty_path_finds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = std::env::join_paths([dir.path()]).unwrap();
        assert!(find_in(Some(paths)).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn override_must_be_executable() {
        let dir = tempfile::tempdir().unwrap();
        let plain = install(dir.path(), "espeak-ng", 0o644);
        assert!(resolve_override(plain.as_os_str()).is_none());

        let missing = dir.path().join("missing-espeak");
        assert!(resolve_override(missing.as_os_str()).is_none());

        let runnable = install(dir.path(), "espeak-custom", 0o755);
        assert_eq!(resolve_override(runnable.as_os_str()), Some(runnable));
    }
}
