//! Synthesizer running as a child process
//!
//! Each inference spawns the configured program, writes the text to its
//! stdin and reads raw little-endian samples from its stdout.

use std::{
    ffi::OsString,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use soprano_config::{CommandModelConfig, SampleEncoding};

use super::{InferenceError, LoadError, SpeechModel};

/// Process-backed speech model
#[derive(Debug)]
pub struct CommandModel {
    name: String,
    program: PathBuf,
    args: Vec<OsString>,
    sample_rate: u32,
    encoding: SampleEncoding,
}

impl CommandModel {
    /// Resolve the program and check the model files are present
    ///
    /// # Errors
    ///
    /// Fails when the program cannot be found or `model_path` is missing
    pub fn load(name: &str, sample_rate: u32, config: &CommandModelConfig) -> Result<Self, LoadError> {
        let program =
            resolve_program(&config.program).ok_or_else(|| LoadError::ProgramNotFound(config.program.clone()))?;

        if let Some(ref model_path) = config.model_path
            && !model_path.exists()
        {
            return Err(LoadError::MissingModelFile(model_path.clone()));
        }

        tracing::debug!(program = %program.display(), encoding = ?config.sample_encoding, "resolved synthesizer");

        Ok(Self {
            name: name.to_string(),
            program,
            args: config.args.iter().map(OsString::from).collect(),
            sample_rate,
            encoding: config.sample_encoding,
        })
    }
}

impl SpeechModel for CommandModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn infer(&self, text: &str) -> Result<Vec<f32>, InferenceError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(InferenceError::Spawn)?;

        let stdin = child.stdin.take();

        // stdin is fed from a second thread so a synthesizer that streams
        // output before reading all of its input cannot deadlock us
        let (output, written) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(text.as_bytes()),
                None => Ok(()),
            });

            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));

            (output, written)
        });

        let output = output.map_err(InferenceError::Io)?;

        if !output.status.success() {
            return Err(InferenceError::Exited {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // A synthesizer may exit before draining stdin; only the exit status matters then
        if let Err(e) = written
            && e.kind() != ErrorKind::BrokenPipe
        {
            return Err(InferenceError::Io(e));
        }

        decode_samples(&output.stdout, self.encoding)
    }
}

fn resolve_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);

    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|path| path.is_file())
}

fn decode_samples(bytes: &[u8], encoding: SampleEncoding) -> Result<Vec<f32>, InferenceError> {
    let width = encoding.width();

    if bytes.len() % width != 0 {
        return Err(InferenceError::TruncatedOutput {
            len: bytes.len(),
            width,
        });
    }

    let samples = match encoding {
        SampleEncoding::S16le => bytes
            .chunks_exact(2)
            .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / f32::from(i16::MAX))
            .collect(),
        SampleEncoding::F32le => bytes
            .chunks_exact(4)
            .map(|quad| f32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]]))
            .collect(),
    };

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(program: &str, encoding: SampleEncoding) -> CommandModelConfig {
        CommandModelConfig {
            program: program.to_string(),
            args: Vec::new(),
            model_path: None,
            sample_encoding: encoding,
        }
    }

    #[test]
    fn decode_s16le() {
        let bytes = [0x00, 0x00, 0xff, 0x7f, 0x01, 0x80];
        let samples = decode_samples(&bytes, SampleEncoding::S16le).unwrap();
        assert_eq!(samples, vec![0.0, 1.0, -1.0]);
    }

    #[test]
    fn decode_f32le() {
        let bytes: Vec<u8> = [0.25f32, -0.75].iter().flat_map(|s| s.to_le_bytes()).collect();
        let samples = decode_samples(&bytes, SampleEncoding::F32le).unwrap();
        assert_eq!(samples, vec![0.25, -0.75]);
    }

    #[test]
    fn partial_sample_is_rejected() {
        let err = decode_samples(&[1, 2, 3], SampleEncoding::S16le).unwrap_err();
        assert!(matches!(err, InferenceError::TruncatedOutput { len: 3, width: 2 }));
    }

    #[test]
    fn unknown_program_fails_to_load() {
        let err = CommandModel::load(
            "soprano-80m",
            32_000,
            &config("soprano-synth-that-does-not-exist", SampleEncoding::S16le),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::ProgramNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn missing_model_file_fails_to_load() {
        let mut settings = config("cat", SampleEncoding::S16le);
        settings.model_path = Some(PathBuf::from("/nonexistent/soprano-80m.safetensors"));

        let err = CommandModel::load("soprano-80m", 32_000, &settings).unwrap_err();
        assert!(matches!(err, LoadError::MissingModelFile(_)));
    }

    // `cat` echoes the text back, so its bytes become the samples
    #[cfg(unix)]
    #[test]
    fn infers_through_child_process() {
        let model = CommandModel::load("echo", 32_000, &config("cat", SampleEncoding::S16le)).unwrap();
        assert_eq!(model.name(), "echo");
        assert_eq!(model.sample_rate(), 32_000);

        let samples = model.infer("abcd").unwrap();
        let expected = decode_samples(b"abcd", SampleEncoding::S16le).unwrap();
        assert_eq!(samples, expected);
    }

    #[cfg(unix)]
    #[test]
    fn odd_output_length_is_an_error() {
        let model = CommandModel::load("echo", 32_000, &config("cat", SampleEncoding::S16le)).unwrap();
        let err = model.infer("abc").unwrap_err();
        assert!(matches!(err, InferenceError::TruncatedOutput { len: 3, width: 2 }));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_reports_stderr() {
        let mut settings = config("sh", SampleEncoding::S16le);
        settings.args = vec!["-c".into(), "echo 'voice pack missing' >&2; exit 3".into()];

        let model = CommandModel::load("broken", 32_000, &settings).unwrap();
        let err = model.infer("hello").unwrap_err();

        let InferenceError::Exited { status, stderr } = err else {
            panic!("expected exit error, got {err:?}");
        };
        assert_eq!(status.code(), Some(3));
        assert_eq!(stderr, "voice pack missing");
    }
}
