// Build automation tool - suppress style lints
#![allow(clippy::needless_borrow)]

use serde::Deserialize;
use sha2::{Digest, Sha256};
use shell_escape::escape;
use std::borrow::Cow;
use std::env;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::process::Command;

const TARGET: &str = "aarch64-unknown-none";
const BIN: &str = "cboot";
const IMAGE_NAME: &str = "kernel8.img";

fn run(cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("[RUN] {}", render(cmd));
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("command failed: {}", render(cmd));
    }
    Ok(())
}

/// Shell-pasteable form of a command line
fn render(cmd: &Command) -> String {
    let mut parts = vec![escape(cmd.get_program().to_string_lossy()).into_owned()];
    parts.extend(
        cmd.get_args()
            .map(|a| escape(Cow::Owned(a.to_string_lossy().into_owned())).into_owned()),
    );
    parts.join(" ")
}

fn cargo() -> Command {
    Command::new("cargo")
}
fn rustup() -> Command {
    Command::new("rustup")
}

fn root() -> anyhow::Result<PathBuf> {
    // xtask lives one level below the workspace root
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    match manifest_dir.parent() {
        Some(p) => Ok(p.to_path_buf()),
        None => anyhow::bail!("xtask manifest has no parent directory"),
    }
}

fn ensure_dist() -> anyhow::Result<PathBuf> {
    let dist = root()?.join("build/dist");
    fs::create_dir_all(&dist)?;
    Ok(dist)
}

fn task_fmt() -> anyhow::Result<()> {
    run(cargo().args(["fmt", "--all"]))
}

fn task_fmt_check() -> anyhow::Result<()> {
    run(cargo().args(["fmt", "--all", "--", "--check"]))
}

fn task_clippy() -> anyhow::Result<()> {
    run(cargo().args([
        "clippy",
        "--workspace",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]))
}

fn task_test() -> anyhow::Result<()> {
    run(cargo().args(["test", "-p", BIN, "--lib", "--tests"]))
}

fn task_check() -> anyhow::Result<()> {
    task_fmt_check()?;
    task_clippy()?;
    task_test()
}

/// Build the bare-metal ELF and flatten it into the image the firmware loads
fn task_image(args: &[String]) -> anyhow::Result<PathBuf> {
    let dist = ensure_dist()?;
    let root_dir = root()?;
    let verbose = args.iter().any(|a| a == "--verbose");

    let mut cmd = cargo();
    cmd.current_dir(&root_dir)
        .args(["build", "-p", BIN, "--release", "--target", TARGET, "--bin", BIN]);
    if verbose {
        cmd.args(["--features", "verbose"]);
    }
    run(&mut cmd)?;

    let elf_in_target = root_dir.join(format!("target/{}/release/{}", TARGET, BIN));
    let out_elf = dist.join(format!("{}.elf", BIN));
    fs::copy(&elf_in_target, &out_elf)?;

    let out_img = dist.join(IMAGE_NAME);
    let Some(objcopy) = find_objcopy() else {
        anyhow::bail!("no objcopy found; install llvm-tools (rustup component add llvm-tools) or binutils for aarch64");
    };
    eprintln!("[OBJCOPY] Using {} -> {}", objcopy, out_img.display());
    let mut flatten = Command::new(objcopy);
    flatten
        .args(["-O", "binary"])
        .arg(&out_elf)
        .arg(&out_img);
    run(&mut flatten)?;

    eprintln!(
        "[ARTIFACT] {} ({} bytes), {} ({} bytes)",
        out_elf.display(),
        out_elf.metadata()?.len(),
        out_img.display(),
        out_img.metadata()?.len()
    );

    // Fresh checksums for this build only
    let sums = dist.join("SHA256SUMS");
    if sums.exists() {
        fs::remove_file(&sums)?;
    }
    append_checksum(&out_elf, &format!("{}.elf", BIN))?;
    append_checksum(&out_img, IMAGE_NAME)?;
    write_manifest(&[
        (format!("{}.elf", BIN), out_elf.clone()),
        (IMAGE_NAME.to_string(), out_img),
    ])?;
    Ok(out_elf)
}

fn have(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

fn find_objcopy() -> Option<&'static str> {
    [
        "rust-objcopy",
        "llvm-objcopy",
        "aarch64-linux-gnu-objcopy",
        "aarch64-none-elf-objcopy",
        "aarch64-elf-objcopy",
    ]
    .into_iter()
    .find(|c| have(c))
}

fn sha256_file(path: &Path) -> anyhow::Result<String> {
    let data = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn append_checksum(path: &Path, name: &str) -> anyhow::Result<()> {
    let sums_path = ensure_dist()?.join("SHA256SUMS");
    let sum = sha256_file(path)?;
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&sums_path)?;
    writeln!(f, "{}  {}", sum, name)?;
    eprintln!("[CHECKSUM] {}  {}", sum, name);
    Ok(())
}

fn tool_version(cmd: &str) -> Option<String> {
    let out = Command::new(cmd).arg("--version").output().ok()?;
    let first_line = |bytes: &[u8]| {
        String::from_utf8_lossy(bytes)
            .lines()
            .next()
            .unwrap_or("")
            .to_string()
    };
    let mut s = first_line(&out.stdout);
    if s.is_empty() {
        s = first_line(&out.stderr);
    }
    (!s.is_empty()).then_some(s)
}

fn write_manifest(artifacts: &[(String, PathBuf)]) -> anyhow::Result<()> {
    let dist = ensure_dist()?;
    let mut list = vec![];
    for (name, path) in artifacts {
        if path.exists() {
            let size = path.metadata().map(|m| m.len()).unwrap_or(0);
            let sum = sha256_file(path).ok();
            list.push(serde_json::json!({
                "name": name,
                "path": path.to_string_lossy(),
                "bytes": size,
                "sha256": sum,
            }));
        }
    }
    let manifest = serde_json::json!({
        "versions": {
            "rustc": tool_version("rustc"),
            "cargo": tool_version("cargo"),
            "qemu-system-aarch64": tool_version("qemu-system-aarch64"),
            "objcopy": find_objcopy(),
        },
        "target": TARGET,
        "artifacts": list,
        "meta": {
            "timestamp": std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .ok()
                .map(|d| d.as_secs()),
            "source_date_epoch": env::var("SOURCE_DATE_EPOCH").ok(),
            "xtask_version": env!("CARGO_PKG_VERSION"),
        }
    });
    let out = dist.join("MANIFEST.json");
    fs::write(&out, serde_json::to_vec_pretty(&manifest)?)?;
    eprintln!("[ARTIFACT] {}", out.display());
    Ok(())
}

/// QEMU settings, from `~/.cboot_qemu.toml` then the command line
#[derive(Debug, Deserialize)]
#[serde(default)]
struct QemuOpts {
    machine: String,
    serial: String,
    debug_flags: Option<String>,
    extra: Vec<String>,
}

impl Default for QemuOpts {
    fn default() -> Self {
        Self {
            machine: "raspi3b".into(),
            serial: "stdio".into(),
            debug_flags: None,
            extra: Vec::new(),
        }
    }
}

fn read_qemu_config() -> anyhow::Result<Option<QemuOpts>> {
    let Ok(home) = env::var("HOME") else {
        return Ok(None);
    };
    let path = PathBuf::from(home).join(".cboot_qemu.toml");
    if !path.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(&path)?;
    let opts = toml::from_str(&s)
        .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
    Ok(Some(opts))
}

fn parse_qemu_opts(args: &[String]) -> anyhow::Result<QemuOpts> {
    let mut q = read_qemu_config()?.unwrap_or_default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--machine" if i + 1 < args.len() => {
                q.machine = args[i + 1].clone();
                i += 2;
            }
            "--serial" if i + 1 < args.len() => {
                q.serial = args[i + 1].clone();
                i += 2;
            }
            "--debug-flags" if i + 1 < args.len() => {
                q.debug_flags = Some(args[i + 1].clone());
                i += 2;
            }
            "--verbose" => i += 1,
            "--" => {
                q.extra.extend_from_slice(&args[i + 1..]);
                break;
            }
            other => anyhow::bail!("unknown qemu option: {}", other),
        }
    }
    Ok(q)
}

/// Boot the monitor on an emulated Pi 3B with the UART on the terminal
fn task_qemu(args: &[String]) -> anyhow::Result<()> {
    let opts = parse_qemu_opts(args)?;
    if !have("qemu-system-aarch64") {
        anyhow::bail!("qemu-system-aarch64 not found. Please install QEMU for ARM systems.");
    }
    let elf = task_image(args)?;

    let mut cmd = Command::new("qemu-system-aarch64");
    cmd.args(["-M", &opts.machine])
        .arg("-kernel")
        .arg(&elf)
        .args(["-serial", &opts.serial])
        .args(["-display", "none"]);
    if let Some(flags) = &opts.debug_flags {
        cmd.args(["-d", flags]);
    }
    cmd.args(&opts.extra);
    run(&mut cmd)
}

fn task_env_check() -> anyhow::Result<()> {
    eprintln!("[INFO] Installing {} and the rustup components cboot needs", TARGET);
    run(rustup().args(["target", "add", TARGET]))?;
    run(rustup().args([
        "component",
        "add",
        "rust-src",
        "rustfmt",
        "clippy",
        "llvm-tools",
    ]))?;

    let objcopy = find_objcopy();
    let mut missing = Vec::new();
    if !have("qemu-system-aarch64") {
        missing.push("qemu-system-aarch64");
        eprintln!("[WARN] qemu-system-aarch64 missing (qemu-system-arm on Debian, qemu on Homebrew)");
    }
    if objcopy.is_none() {
        missing.push("objcopy");
        eprintln!("[WARN] no AArch64-capable objcopy found.");
        eprintln!("[INFO] `cargo install cargo-binutils` provides rust-objcopy");
    }

    for tool in ["rustc", "cargo", "qemu-system-aarch64"]
        .into_iter()
        .chain(objcopy)
    {
        let version = tool_version(tool).unwrap_or_else(|| "not found".into());
        eprintln!("[VER] {}: {}", tool, version);
    }

    if missing.is_empty() {
        eprintln!("[INFO] Environment ready.");
        Ok(())
    } else {
        anyhow::bail!("missing tools: {}", missing.join(", "))
    }
}

fn task_clean() -> anyhow::Result<()> {
    run(cargo().arg("clean"))?;
    let dist = root()?.join("build");
    if dist.exists() {
        fs::remove_dir_all(&dist)?;
        eprintln!("[CLEAN] removed {}", dist.display());
    }
    Ok(())
}

fn print_help() {
    eprintln!(
        "xtask commands:\n  fmt | fmt-check | clippy | test | check | env-check | clean\n  image [--verbose]   # build target/.../cboot and build/dist/kernel8.img\n  qemu [--verbose] [--machine <m>] [--serial <dev>] [--debug-flags <flags>] [-- <extra qemu args>]\n\nQEMU defaults may be overridden in ~/.cboot_qemu.toml (machine, serial, debug_flags, extra).\n\nExamples:\n  cargo run -p xtask -- check\n  cargo run -p xtask -- image\n  cargo run -p xtask -- qemu --verbose -- -d guest_errors"
    );
}

fn main() -> anyhow::Result<()> {
    let mut args = env::args().skip(1);
    let cmd = args.next().unwrap_or_else(|| "help".into());
    let rest: Vec<String> = args.collect();
    match cmd.as_str() {
        "fmt" => task_fmt(),
        "fmt-check" => task_fmt_check(),
        "clippy" => task_clippy(),
        "test" => task_test(),
        "check" => task_check(),
        "image" => task_image(&rest).map(|_| ()),
        "qemu" => task_qemu(&rest),
        "env-check" => task_env_check(),
        "clean" => task_clean(),
        _ => {
            print_help();
            Ok(())
        }
    }
}
