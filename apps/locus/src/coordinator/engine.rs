//! Recognition engine subprocess.
//!
//! The engine is invoked as
//! `<program> -input <store> <profile...> <extra...> <workspace>` and its
//! combined stdout and stderr are returned for parsing. The exit code is
//! recorded but never decides success on its own.

use locus_core::LocusError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

/// Fixed localization profile for `rtabmap-console`.
///
/// Localization mode over the whole map, single-threaded deterministic
/// SIFT extraction, no image retention, console logging at info level.
pub const ENGINE_PROFILE: &[&str] = &[
    "--Rtabmap/LoadDatabaseParameters", "false",
    "--Mem/IncrementalMemory", "false",
    "--Mem/InitWMWithAllNodes", "true",
    "--Rtabmap/DetectionRate", "1.0",
    "--Rtabmap/TimeThr", "300",
    "--Mem/STMSize", "0",
    "--Mem/MemoryThr", "0",
    "--Mem/RehearsalSimilarity", "0.0",
    "--Mem/ImageKept", "false",
    "--Mem/BinDataKept", "false",
    "--Mem/RawDescriptorsKept", "true",
    "--RGBD/CreateOccupancyGrid", "false",
    "--Grid/FromDepth", "false",
    "--Kp/DetectorStrategy", "1",
    "--Vis/FeatureType", "1",
    "--SIFT/ContrastThreshold", "0.02",
    "--SIFT/EdgeThreshold", "10",
    "--SIFT/NOctaveLayers", "3",
    "--SIFT/Sigma", "1.6",
    "--SIFT/Gpu", "false",
    "--SIFT/PreciseUpscale", "false",
    "--SIFT/RootSIFT", "false",
    "--SIFT/Upscale", "false",
    "--Kp/MaxFeatures", "2000",
    "--Vis/MaxFeatures", "2000",
    "--Kp/GridCols", "1",
    "--Kp/GridRows", "1",
    "--Kp/RoiRatios", "0.0 0.0 0.0 0.0",
    "--Rtabmap/LoopThr", "0.08",
    "--Vis/MinInliers", "15",
    "--Vis/InlierDistance", "0.1",
    "--Vis/CorNNDR", "0.8",
    "--Vis/RefineIterations", "5",
    "--Vis/CorType", "0",
    "--Vis/CorGuessWinSize", "0",
    "--Vis/CorNNType", "1",
    "--Kp/SubPixWinSize", "3",
    "--Vis/SubPixWinSize", "3",
    "--Kp/SubPixEps", "0.02",
    "--Vis/SubPixEps", "0.02",
    "--Kp/SubPixIterations", "0",
    "--Vis/SubPixIterations", "0",
    "--Mem/ImagePreDecimation", "2",
    "--Mem/ImagePostDecimation", "1",
    "--Kp/Parallelized", "false",
    "--Vis/SSC", "false",
    "--Kp/SSC", "false",
    "--Kp/NewWordsComparedTogether", "true",
    "--Kp/IncrementalFlann", "false",
    "--Kp/FlannRebalancingFactor", "2.0",
    "--Kp/NNStrategy", "1",
    "--Optimizer/Strategy", "1",
    "--Optimizer/Iterations", "3",
    "--RGBD/OptimizeMaxError", "0.1",
    "--Mem/RehearsalWeightIgnoredWhileMoving", "true",
    "--Rtabmap/MaxRetrieved", "100",
    "--Vis/PnPFlags", "0",
    "--Vis/PnPReprojError", "2",
    "--Vis/EstimationType", "1",
    "--RGBD/ProximityPathMaxNeighbors", "0",
    "--RGBD/NeighborLinkRefining", "false",
    "--Rtabmap/StatisticLogged", "true",
    "--Rtabmap/StatisticLoggedHeaders", "true",
    "--Rtabmap/PublishLastLocalizationPose", "false",
    "--Mem/LaserScanDownsampleStep", "1",
    "--Mem/NotLinkedNodesKept", "false",
    "--Rtabmap/ImagesAlreadyRectified", "true",
    "--logconsole",
    "--uinfo",
];

/// How to run the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: PathBuf,
    pub extra_params: Vec<String>,
    pub timeout: Duration,
}

/// Captured outcome of one engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRun {
    /// stdout followed by stderr, lossily decoded.
    pub output: String,
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
}

impl EngineCommand {
    /// Full argument list for one run.
    pub fn args(&self, store: &Path, workspace: &Path) -> Vec<String> {
        let mut args = Vec::with_capacity(ENGINE_PROFILE.len() + self.extra_params.len() + 3);
        args.push("-input".to_string());
        args.push(store.display().to_string());
        args.extend(ENGINE_PROFILE.iter().map(|s| (*s).to_string()));
        args.extend(self.extra_params.iter().cloned());
        args.push(workspace.display().to_string());
        args
    }

    /// Run the engine against `store` over the images in `workspace`.
    ///
    /// On timeout the child is killed and reaped before returning
    /// `EngineTimeout`.
    pub async fn run(&self, store: &Path, workspace: &Path) -> Result<EngineRun, LocusError> {
        let started = Instant::now();
        let mut child = Command::new(&self.program)
            .args(self.args(store, workspace))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                LocusError::EngineFailure(format!(
                    "cannot start {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        tracing::debug!(
            program = %self.program.display(),
            pid = child.id(),
            "engine started"
        );

        match tokio::time::timeout(self.timeout, collect_output(&mut child)).await {
            Ok(Ok((output, exit_code))) => {
                let elapsed = started.elapsed();
                if exit_code != Some(0) {
                    tracing::warn!(
                        exit_code,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "engine exited with non-zero status"
                    );
                }
                Ok(EngineRun {
                    output,
                    exit_code,
                    elapsed,
                })
            }
            Ok(Err(e)) => Err(LocusError::EngineFailure(format!(
                "reading engine output: {}",
                e
            ))),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::error!(error = %e, "failed to kill timed-out engine");
                }
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "engine timed out and was killed"
                );
                Err(LocusError::EngineTimeout {
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

/// Drain both pipes concurrently, then wait for exit.
async fn collect_output(child: &mut Child) -> std::io::Result<(String, Option<i32>)> {
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("stdout not captured"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("stderr not captured"))?;

    let mut out = Vec::new();
    let mut err = Vec::new();
    let (read_out, read_err) = tokio::join!(stdout.read_to_end(&mut out), stderr.read_to_end(&mut err));
    read_out?;
    read_err?;
    let status = child.wait().await?;

    let mut text = String::from_utf8_lossy(&out).into_owned();
    text.push_str(&String::from_utf8_lossy(&err));
    Ok((text, status.code()))
}

/// Whether `program` names an existing file, directly or through `PATH`.
pub fn program_available(program: &Path) -> bool {
    if program.components().count() > 1 {
        return program.is_file();
    }
    std::env::var_os("PATH").is_some_and(|paths| {
        std::env::split_paths(&paths).any(|dir| dir.join(program).is_file())
    })
}
