//! Synthetic auth log generation
//! Produces realistic Apache access and sshd authentication lines for
//! exercising the analyzer without a real traffic capture.

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::dialect::Dialect;

const SOURCE_IPS: [&str; 12] = [
    "203.0.113.9",
    "198.51.100.7",
    "192.0.2.44",
    "83.149.9.216",
    "46.161.40.12",
    "91.234.99.3",
    "117.21.224.191",
    "185.220.101.34",
    "200.1.1.1",
    "78.46.10.20",
    "64.62.197.12",
    "151.80.18.12",
];

const USERS: [&str; 10] = [
    "root", "admin", "alice", "bob", "deploy", "git", "oracle", "test", "ubuntu", "www",
];

const HOSTS: [&str; 3] = ["bastion", "edge1", "vpn-gw"];

const HTTP_PATHS: [&str; 8] = [
    "/",
    "/index.html",
    "/login",
    "/admin/",
    "/api/v1/status",
    "/images/logo.png",
    "/robots.txt",
    "/wp-login.php",
];

/// One line in the given dialect; unknown yields unparseable noise.
pub fn generate_line(dialect: Dialect) -> String {
    match dialect {
        Dialect::Apache => generate_apache_line(),
        Dialect::Ssh => generate_ssh_line(),
        Dialect::Unknown => generate_noise_line(),
    }
}

/// Generate an Apache combined access log line
pub fn generate_apache_line() -> String {
    let mut rng = rand::thread_rng();

    let ip = *SOURCE_IPS.choose(&mut rng).unwrap_or(&"203.0.113.9");
    let method = *["GET", "POST", "HEAD"].choose(&mut rng).unwrap_or(&"GET");
    let path = *HTTP_PATHS.choose(&mut rng).unwrap_or(&"/");
    let status = *[200, 200, 200, 301, 304, 403, 404, 500]
        .choose(&mut rng)
        .unwrap_or(&200);
    let bytes = rng.gen_range(64..65536);
    let timestamp = Utc::now().format("%d/%b/%Y:%H:%M:%S +0000");

    format!(r#"{ip} - - [{timestamp}] "{method} {path} HTTP/1.1" {status} {bytes}"#)
}

/// Generate an sshd syslog line: mostly failures, some accepts, the
/// occasional PAM burst or preauth noise.
pub fn generate_ssh_line() -> String {
    let mut rng = rand::thread_rng();

    let host = *HOSTS.choose(&mut rng).unwrap_or(&"bastion");
    let ip = *SOURCE_IPS.choose(&mut rng).unwrap_or(&"203.0.113.9");
    let user = *USERS.choose(&mut rng).unwrap_or(&"root");
    let pid = rng.gen_range(100..99999);
    let port = rng.gen_range(1024..65535);
    let timestamp = Utc::now().format("%b %d %H:%M:%S");
    let prefix = format!("{timestamp} {host} sshd[{pid}]");

    match rng.gen_range(0..10) {
        0..=4 => {
            if rng.gen_bool(0.4) {
                format!(
                    "{prefix}: Failed password for invalid user {user} from {ip} port {port} ssh2"
                )
            } else {
                format!("{prefix}: Failed password for {user} from {ip} port {port} ssh2")
            }
        }
        5..=6 => format!("{prefix}: Accepted password for {user} from {ip} port {port} ssh2"),
        7 => format!(
            "{prefix}: PAM {} more authentication failures; logname= uid=0 euid=0 tty=ssh ruser= rhost={ip}  user={user}",
            rng.gen_range(1..5)
        ),
        8 => format!("{prefix}: Connection closed by {ip} port {port} [preauth]"),
        _ => format!(
            "{prefix}: Received disconnect from {ip} port {port}:11: Bye Bye [preauth]"
        ),
    }
}

fn generate_noise_line() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "{} service heartbeat seq={}",
        Utc::now().to_rfc3339(),
        rng.gen::<u32>()
    )
}
