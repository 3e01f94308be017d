use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Stdin,
    Stdout,
    Stderr,
}

impl Stream {
    pub fn fd(&self) -> i32 {
        match self {
            Stream::Stdin => 0,
            Stream::Stdout => 1,
            Stream::Stderr => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    Read,
    Truncate,
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub stream: Stream,
    pub mode: RedirectMode,
    pub path: PathBuf,
}

/// One command of a pipeline with redirections already separated from its
/// arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub args: Vec<String>,
    pub stdin: Option<Redirect>,
    pub stdout: Option<Redirect>,
    pub stderr: Option<Redirect>,
}

impl Stage {
    pub fn name(&self) -> &str {
        // the parser never produces a stage without a command word
        self.args.first().map(String::as_str).unwrap_or_default()
    }

    pub fn params(&self) -> &[String] {
        self.args.get(1..).unwrap_or_default()
    }

    pub fn redirect(&self, stream: Stream) -> Option<&Redirect> {
        match stream {
            Stream::Stdin => self.stdin.as_ref(),
            Stream::Stdout => self.stdout.as_ref(),
            Stream::Stderr => self.stderr.as_ref(),
        }
    }

    pub(super) fn set_redirect(&mut self, redirect: Redirect) {
        let slot = match redirect.stream {
            Stream::Stdin => &mut self.stdin,
            Stream::Stdout => &mut self.stdout,
            Stream::Stderr => &mut self.stderr,
        };
        *slot = Some(redirect);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Number of anonymous pipes connecting the stages.
    #[inline]
    pub fn pipe_count(&self) -> usize {
        self.stages.len().saturating_sub(1)
    }
}
