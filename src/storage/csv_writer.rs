use crate::config::LockPolicy;
use crate::errors::{Result, SectorHubError};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// 文件被占用时向操作者确认，确认后重试写入
pub trait Acknowledger: Send {
    fn acknowledge(&self, message: &str) -> Result<()>;
}

/// 从标准输入等待回车
pub struct StdinAcknowledger;

impl Acknowledger for StdinAcknowledger {
    fn acknowledge(&self, message: &str) -> Result<()> {
        println!("{}", message);
        print!("Once you have closed the file, press Enter for the program to resume.");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// 表头加全部行，文件被重建
    Created { rows: usize },
    /// 只追加数据行
    Appended { rows: usize },
    /// 文件被占用，本次未写入
    Skipped { reason: String },
}

#[derive(Debug, Default, Clone, Copy)]
struct TargetState {
    created_this_run: bool,
}

/// 支持新建或追加的 CSV 写入器，按目标文件记录本次运行是否已重建过
pub struct IncrementalCsvWriter {
    targets: HashMap<PathBuf, TargetState>,
    lock_policy: LockPolicy,
    acknowledger: Box<dyn Acknowledger>,
}

impl IncrementalCsvWriter {
    pub fn new(lock_policy: LockPolicy) -> Self {
        Self::with_acknowledger(lock_policy, Box::new(StdinAcknowledger))
    }

    pub fn with_acknowledger(lock_policy: LockPolicy, acknowledger: Box<dyn Acknowledger>) -> Self {
        Self {
            targets: HashMap::new(),
            lock_policy,
            acknowledger,
        }
    }

    pub fn lock_policy(&self) -> LockPolicy {
        self.lock_policy
    }

    /// 本次运行中该文件是否已经被重建过
    pub fn created_this_run(&self, path: &Path) -> bool {
        self.targets.get(path).map(|s| s.created_this_run).unwrap_or(false)
    }

    /// 写入一批行
    ///
    /// `overwrite` 为 true 时总是重建文件（表头加本批数据）；否则文件不存在或为空时
    /// 新建，已有数据时只追加，不重复写表头。
    pub fn write<H, R>(&mut self, path: &Path, headers: &[H], rows: &[R], overwrite: bool) -> Result<WriteOutcome>
    where
        H: AsRef<str>,
        R: Serialize,
    {
        loop {
            match self.try_write(path, headers, rows, overwrite) {
                Err(SectorHubError::FileLocked(name)) => {
                    let message = format!(
                        "The file {} is locked. Please unlock or close the file before rerunning.",
                        name
                    );
                    match self.lock_policy {
                        LockPolicy::Skip => {
                            warn!("{}", message);
                            return Ok(WriteOutcome::Skipped { reason: message });
                        }
                        LockPolicy::Prompt => self.acknowledger.acknowledge(&message)?,
                    }
                }
                other => return other,
            }
        }
    }

    /// 本次运行内第一次写入时按 `overwrite_run` 重建，之后都追加
    pub fn write_incremental<H, R>(
        &mut self,
        path: &Path,
        headers: &[H],
        rows: &[R],
        overwrite_run: bool,
    ) -> Result<WriteOutcome>
    where
        H: AsRef<str>,
        R: Serialize,
    {
        let overwrite = overwrite_run && !self.created_this_run(path);
        self.write(path, headers, rows, overwrite)
    }

    fn try_write<H, R>(&mut self, path: &Path, headers: &[H], rows: &[R], overwrite: bool) -> Result<WriteOutcome>
    where
        H: AsRef<str>,
        R: Serialize,
    {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let existing_rows = count_rows(path).map_err(|e| lock_error(e, path))?;

        if overwrite || existing_rows == 0 {
            let file = File::create(path).map_err(|e| lock_error(e, path))?;
            let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
            writer.write_record(headers.iter().map(|h| h.as_ref()))?;
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;

            self.targets.entry(path.to_path_buf()).or_default().created_this_run = true;
            info!("{} was created with {} rows", path.display(), rows.len());
            Ok(WriteOutcome::Created { rows: rows.len() })
        } else {
            let file = OpenOptions::new().append(true).open(path).map_err(|e| lock_error(e, path))?;
            let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;

            debug!("Appended {} rows to {} ({} rows before)", rows.len(), path.display(), existing_rows);
            Ok(WriteOutcome::Appended { rows: rows.len() })
        }
    }
}

/// 确认文件可读写，返回现有行数（含表头）
fn count_rows(path: &Path) -> io::Result<usize> {
    OpenOptions::new().create(true).append(true).open(path)?;
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);
    Ok(reader.byte_records().count())
}

/// 权限错误视为文件被其他进程占用
pub(crate) fn lock_error(err: io::Error, path: &Path) -> SectorHubError {
    if err.kind() == io::ErrorKind::PermissionDenied {
        SectorHubError::FileLocked(path.display().to_string())
    } else {
        SectorHubError::IoError(err)
    }
}
