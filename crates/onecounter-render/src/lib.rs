//! Text-only rendering of one-counter automata and behaviour graphs to
//! Graphviz DOT. Shelling out to a `dot` binary and producing an actual
//! image are both out of scope here: `emit` only ever produces DOT source,
//! either written to a file or logged at `trace` level.

use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("could not write DOT output to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A complete `digraph { ... }` body, already formatted.
#[derive(Debug, Clone)]
pub struct DotDocument(pub String);

/// Anything describable as a Graphviz digraph. Implemented by
/// `onecounter-core` for `V1ca`, `R1ca` and `BehaviourGraph` when the
/// `render` feature is enabled.
pub trait ToDot {
    fn to_dot(&self) -> DotDocument;
}

/// Where rendered DOT output goes. `Trace` just logs it; `File` writes
/// `<dir>/<tag>.dot`.
#[derive(Debug, Clone)]
pub enum Sink {
    Trace,
    File { dir: PathBuf },
}

fn sink_from_env() -> Sink {
    match std::env::var("ONECOUNTER_RENDER_DIR") {
        Ok(dir) if !dir.is_empty() => Sink::File { dir: PathBuf::from(dir) },
        _ => Sink::Trace,
    }
}

/// Renders `obj` to DOT and sends it to the configured [`Sink`] (a file
/// directory named by the `ONECOUNTER_RENDER_DIR` environment variable, or
/// a `trace`-level log line otherwise). Errors are logged, not propagated:
/// a failed render must never abort a learning run.
pub fn emit(obj: &impl ToDot, tag: &str) {
    let dot = obj.to_dot();
    if let Err(e) = write_to_sink(&sink_from_env(), tag, &dot) {
        tracing::warn!(tag, error = %e, "failed to emit DOT render");
    }
}

fn write_to_sink(sink: &Sink, tag: &str, dot: &DotDocument) -> Result<(), RenderError> {
    match sink {
        Sink::Trace => {
            trace!(tag, dot = %dot.0, "rendered automaton");
            Ok(())
        }
        Sink::File { dir } => {
            let path = dir.join(format!("{tag}.dot"));
            let mut file = std::fs::File::create(&path).map_err(|source| RenderError::Io {
                path: path.clone(),
                source,
            })?;
            file.write_all(dot.0.as_bytes())
                .map_err(|source| RenderError::Io { path, source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture;
    impl ToDot for Fixture {
        fn to_dot(&self) -> DotDocument {
            DotDocument("digraph fixture {\n  0 -> 1 [label=\"a\"];\n}\n".to_string())
        }
    }

    #[test]
    fn emit_writes_a_dot_file_when_sink_is_file() {
        let tmp = std::env::temp_dir().join(format!("onecounter-render-test-{}", std::process::id()));
        std::fs::create_dir_all(&tmp).unwrap();
        let dot = Fixture.to_dot();
        write_to_sink(&Sink::File { dir: tmp.clone() }, "fixture", &dot).unwrap();
        let written = std::fs::read_to_string(tmp.join("fixture.dot")).unwrap();
        assert_eq!(written, dot.0);
        std::fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn trace_sink_never_errors() {
        let dot = Fixture.to_dot();
        assert!(write_to_sink(&Sink::Trace, "fixture", &dot).is_ok());
    }
}
