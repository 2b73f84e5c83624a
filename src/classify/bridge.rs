//! External-process classifier collaborator. Talks to a python vision
//! bridge: one invocation per call, JSON object on stdout.

use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde::Deserialize;

use crate::classify::{PageClassifier, PageImage};
use crate::core::error::ClassifierError;
use crate::core::model::{ContentType, PageClassification};

#[derive(Debug, Clone, Deserialize)]
struct BridgeClassification {
    #[serde(default)]
    printed_page: Option<u32>,
    content_type: ContentType,
    #[serde(default)]
    detected_title: Option<String>,
    #[serde(default)]
    has_notation: bool,
    #[serde(default = "default_confidence")]
    confidence: f32,
}

fn default_confidence() -> f32 {
    0.5
}

#[derive(Debug, Deserialize)]
struct BridgeVerification {
    #[serde(default)]
    verified: bool,
}

#[derive(Debug, Clone)]
pub struct VisionBridge {
    script_path: PathBuf,
    model: String,
    timeout: Duration,
}

impl VisionBridge {
    pub fn new() -> Self {
        Self {
            script_path: PathBuf::from("classifier/vision_bridge.py"),
            model: "default".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_script(mut self, script_path: PathBuf) -> Self {
        self.script_path = script_path;
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn run(&self, mut command: Command) -> Result<Vec<u8>, ClassifierError> {
        let output = run_with_timeout(&mut command, self.timeout)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClassifierError::Unavailable(format!(
                "bridge exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

impl Default for VisionBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PageClassifier for VisionBridge {
    fn classify(
        &self,
        page: &PageImage,
        hint_titles: &[String],
    ) -> Result<PageClassification, ClassifierError> {
        let mut command = Command::new("python3");
        command
            .arg(&self.script_path)
            .arg("classify")
            .arg("--image")
            .arg(&page.path)
            .arg("--model")
            .arg(&self.model);
        if !hint_titles.is_empty() {
            command.arg("--hints").arg(hint_titles.join("\n"));
        }

        let stdout = self.run(command)?;
        let parsed: BridgeClassification = serde_json::from_slice(&stdout)
            .map_err(|err| ClassifierError::InvalidResponse(err.to_string()))?;

        Ok(PageClassification {
            pdf_page: page.pdf_page,
            printed_page: parsed.printed_page,
            content_type: parsed.content_type,
            detected_title: parsed.detected_title.filter(|t| !t.trim().is_empty()),
            has_notation: parsed.has_notation,
            confidence: parsed.confidence.clamp(0.0, 1.0),
        })
    }

    fn verify(&self, page: &PageImage, expected_title: &str) -> Result<bool, ClassifierError> {
        let mut command = Command::new("python3");
        command
            .arg(&self.script_path)
            .arg("verify")
            .arg("--image")
            .arg(&page.path)
            .arg("--title")
            .arg(expected_title)
            .arg("--model")
            .arg(&self.model);

        let stdout = self.run(command)?;
        let parsed: BridgeVerification = serde_json::from_slice(&stdout)
            .map_err(|err| ClassifierError::InvalidResponse(err.to_string()))?;
        Ok(parsed.verified)
    }
}

/// Run a command with a wall-clock limit. The child is left to finish on
/// its own after a timeout; its output is discarded.
fn run_with_timeout(command: &mut Command, timeout: Duration) -> Result<Output, ClassifierError> {
    let child = command
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(|err| ClassifierError::Unavailable(err.to_string()))?;

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(child.wait_with_output());
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(err)) => Err(ClassifierError::Unavailable(err.to_string())),
        Err(_) => Err(ClassifierError::Timeout(timeout.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bridge_classification() {
        let raw = r#"{
            "content_type": "song_start",
            "detected_title": "Imagine",
            "printed_page": 48,
            "has_notation": true,
            "confidence": 0.92
        }"#;
        let parsed: BridgeClassification = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.content_type, ContentType::SongStart);
        assert_eq!(parsed.detected_title.as_deref(), Some("Imagine"));
        assert_eq!(parsed.printed_page, Some(48));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let parsed: BridgeClassification =
            serde_json::from_str(r#"{"content_type": "blank"}"#).unwrap();
        assert_eq!(parsed.confidence, 0.5);
        assert!(!parsed.has_notation);
        assert!(parsed.detected_title.is_none());
    }

    #[test]
    fn missing_binary_reports_unavailable() {
        let bridge = VisionBridge::new().with_script(PathBuf::from("/nonexistent/bridge.py"));
        let page = PageImage {
            pdf_page: 1,
            path: PathBuf::from("/nonexistent/page.png"),
        };
        // python3 exists in most environments but the script does not, so
        // either spawn failure or a nonzero exit maps to Unavailable.
        match bridge.classify(&page, &[]) {
            Err(ClassifierError::Unavailable(_)) | Err(ClassifierError::Timeout(_)) => {}
            other => panic!("expected unavailable, got {other:?}"),
        }
    }
}
