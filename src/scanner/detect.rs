// src/scanner/detect.rs
use log::{debug, warn};

use crate::common::targets::Target;
use crate::context::Options;
use crate::scanner::{DetectReason, DetectionResult};
use crate::transport::{AuthOutcome, Transport, TransportError};

/// 检测阶段的none认证使用的探测用户名
const PROBE_USERNAME: &str = "root";

const OPENSSH_PREFIX: &str = "SSH-2.0-OpenSSH";

/// 目标资格判定状态机。每个目标只跑一次，连接失败不重试，
/// 第一个不通过的检查直接定论。所有分支都收敛为一个分类结果。
pub fn classify(transport: &dyn Transport, target: &Target, options: &Options) -> DetectionResult {
    let timeout = options.timeout;

    // 1. 连接并读取标识串
    let banner = match transport.read_banner(target, timeout) {
        Ok(banner) => banner,
        Err(TransportError::NoBanner) => {
            debug!("{} - Error receiving banner!", target);
            return DetectionResult::new(target, false, String::new(), DetectReason::NoBanner);
        }
        Err(e) => {
            debug!("[!] Error connecting to {} {}.", target, e);
            return DetectionResult::new(target, false, String::new(), DetectReason::Unreachable);
        }
    };
    debug!("[+] {} - Connected.", target);

    // 2. 标识串检查
    if !banner.starts_with("SSH-") {
        warn!("[!] {} - It's not a SSH server (tcpwrapped) skipping.", target);
        return DetectionResult::new(target, false, banner, DetectReason::NotSsh);
    }

    // 3. 产品检查
    let openssh = banner.starts_with(OPENSSH_PREFIX);
    if !openssh {
        warn!("[!] {} - {} It's not a OpenSSH server", target, banner);
        if !options.non_openssh {
            return DetectionResult::new(target, false, banner, DetectReason::NotOpenSsh);
        }
    }

    // 4. 蜜罐启发式检查，只对OpenSSH目标做
    if openssh {
        match transport.honeypot_check(target, timeout) {
            Ok(true) => {}
            Ok(false) => {
                warn!("[!] {} - Possible honeypot detected.", target);
                if !options.allow_honeypots {
                    return DetectionResult::new(
                        target,
                        false,
                        banner,
                        DetectReason::PossibleHoneypot,
                    );
                }
            }
            Err(e) => {
                debug!("[!] {} - Honeypot probe failed: {}", target, e);
                return DetectionResult::new(target, false, banner, DetectReason::Unreachable);
            }
        }
    }

    // 5. none认证探测
    let mut session = match transport.open_session(target, timeout) {
        Ok(session) => session,
        Err(e) => {
            debug!("[!] Error connecting to {} {}.", target, e);
            return DetectionResult::new(target, false, banner, DetectReason::Unreachable);
        }
    };

    match session.auth_none(PROBE_USERNAME) {
        AuthOutcome::Success => {
            debug!("[!] {} - Server without authentication. (not eligible)", target);
            return DetectionResult::new(target, false, banner, DetectReason::NoAuthRequired);
        }
        AuthOutcome::Error(e) => {
            debug!("[!] {} - auth_none(): A serious error happened: {} (not eligible)", target, e);
            return DetectionResult::new(target, false, banner, DetectReason::AuthProbeError);
        }
        AuthOutcome::Failure => {}
    }

    // 6. 认证方式检查，必须支持密码认证
    match session.auth_methods(PROBE_USERNAME) {
        Ok(methods) if methods.password => {}
        Ok(_) => {
            warn!(
                "[!] {} - {} The server doesn't accept password authentication method",
                target, banner
            );
            return DetectionResult::new(target, false, banner, DetectReason::NoPasswordAuth);
        }
        Err(e) => {
            debug!("[!] {} - auth_methods(): {} (not eligible)", target, e);
            return DetectionResult::new(target, false, banner, DetectReason::AuthProbeError);
        }
    }

    DetectionResult::new(target, true, banner, DetectReason::Eligible)
}
