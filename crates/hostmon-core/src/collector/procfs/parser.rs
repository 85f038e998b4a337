//! Pure parsers for the provider files the samplers read.

/// A provider file did not have the shape the parser expected.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError(String);

impl ParseError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }

    /// What went wrong, without the "malformed" framing of [`Display`].
    ///
    /// [`Display`]: std::fmt::Display
    pub fn detail(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed provider data: {}", self.0)
    }
}

impl std::error::Error for ParseError {}

/// Sector size used by `/proc/diskstats` sector counts.
pub const SECTOR_SIZE: u64 = 512;

/// Cumulative CPU time counters for one `cpu` line of `/proc/stat`,
/// in jiffies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuTimes {
    /// `None` for the aggregate `cpu` line, `Some(n)` for `cpuN`.
    pub cpu_id: Option<usize>,
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    /// Total jiffies accumulated on this CPU.
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }

    /// Non-idle jiffies (idle and iowait both count as idle time).
    pub fn busy(&self) -> u64 {
        self.total() - self.idle - self.iowait
    }
}

/// Parses the `cpu*` lines of `/proc/stat`.
///
/// Returns the aggregate line first, then per-CPU lines in file order.
pub fn parse_stat_cpus(content: &str) -> Result<Vec<CpuTimes>, ParseError> {
    let mut cpus = Vec::new();

    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let Some(label) = fields.next() else {
            continue;
        };
        if !label.starts_with("cpu") {
            continue;
        }

        let cpu_id = if label == "cpu" {
            None
        } else {
            Some(
                label[3..]
                    .parse::<usize>()
                    .map_err(|_| ParseError::new(format!("bad cpu label '{}'", label)))?,
            )
        };

        let mut next = |name: &str| -> Result<u64, ParseError> {
            fields
                .next()
                .ok_or_else(|| ParseError::new(format!("missing {} for {}", name, label)))?
                .parse()
                .map_err(|_| ParseError::new(format!("invalid {} for {}", name, label)))
        };

        cpus.push(CpuTimes {
            cpu_id,
            user: next("user")?,
            nice: next("nice")?,
            system: next("system")?,
            idle: next("idle")?,
            // Older kernels stop after idle; treat missing tail fields as 0.
            iowait: next("iowait").unwrap_or(0),
            irq: next("irq").unwrap_or(0),
            softirq: next("softirq").unwrap_or(0),
            steal: next("steal").unwrap_or(0),
        });
    }

    if cpus.is_empty() {
        return Err(ParseError::new("no cpu lines in stat"));
    }
    Ok(cpus)
}

/// Memory figures from `/proc/meminfo`, all in kilobytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub mem_available: u64,
    pub cached: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

/// Parses `/proc/meminfo` (`Key:   value kB` lines).
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();
    let mut seen_total = false;

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let value: u64 = match rest.split_whitespace().next().and_then(|v| v.parse().ok()) {
            Some(v) => v,
            None => continue,
        };
        match key.trim() {
            "MemTotal" => {
                info.mem_total = value;
                seen_total = true;
            }
            "MemFree" => info.mem_free = value,
            "MemAvailable" => info.mem_available = value,
            "Cached" => info.cached = value,
            "SwapTotal" => info.swap_total = value,
            "SwapFree" => info.swap_free = value,
            _ => {}
        }
    }

    if !seen_total {
        return Err(ParseError::new("MemTotal missing from meminfo"));
    }
    // Pre-3.14 kernels have no MemAvailable; fall back to MemFree.
    if info.mem_available == 0 {
        info.mem_available = info.mem_free;
    }
    Ok(info)
}

/// Cumulative I/O counters for one device line of `/proc/diskstats`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiskCounters {
    pub device: String,
    pub reads: u64,
    pub read_sectors: u64,
    pub writes: u64,
    pub write_sectors: u64,
    /// Total time spent doing I/O, milliseconds (field 13).
    pub io_ms: u64,
}

/// Parses `/proc/diskstats`, keeping whole devices only.
///
/// Partitions, loop and ram devices are skipped: rates and persisted
/// counters are tracked per physical device, matching what the state file
/// keys on.
pub fn parse_diskstats(content: &str) -> Result<Vec<DiskCounters>, ParseError> {
    let mut disks = Vec::new();

    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 13 {
            continue;
        }
        let name = fields[2];
        if name.starts_with("loop") || name.starts_with("ram") || name.starts_with("dm-") {
            continue;
        }
        if is_partition_name(name) {
            continue;
        }

        let num = |idx: usize| -> u64 { fields[idx].parse().unwrap_or(0) };
        disks.push(DiskCounters {
            device: name.to_string(),
            reads: num(3),
            read_sectors: num(5),
            writes: num(7),
            write_sectors: num(9),
            io_ms: num(12),
        });
    }

    Ok(disks)
}

/// Heuristic partition test on a block device name.
///
/// `nvme0n1p2` and `mmcblk0p1` carry an explicit `p<digit>` suffix.
/// Classic scsi/ide/virtio disks are a known prefix plus letters (`sda`,
/// `xvdb`); trailing digits there mark a partition (`sda1`). Anything
/// else ending in a digit (`sr0`, `fd0`, `md0`, `nbd0`) is a whole
/// device in its own right.
pub fn is_partition_name(name: &str) -> bool {
    if name.starts_with("nvme") || name.starts_with("mmcblk") {
        let mut chars = name.chars().rev().peekable();
        let mut saw_digit = false;
        while let Some(c) = chars.peek() {
            if c.is_ascii_digit() {
                saw_digit = true;
                chars.next();
            } else {
                break;
            }
        }
        return saw_digit && chars.peek() == Some(&'p');
    }

    for prefix in ["xvd", "sd", "hd", "vd"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            return rest.starts_with(|c: char| c.is_ascii_alphabetic())
                && rest.ends_with(|c: char| c.is_ascii_digit());
        }
    }
    false
}

/// Cumulative traffic counters for one interface line of `/proc/net/dev`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetDevCounters {
    pub name: String,
    pub rx_bytes: u64,
    pub rx_errs: u64,
    pub tx_bytes: u64,
    pub tx_errs: u64,
}

/// Parses `/proc/net/dev`. The loopback interface is skipped.
pub fn parse_net_dev(content: &str) -> Result<Vec<NetDevCounters>, ParseError> {
    let mut interfaces = Vec::new();

    // First two lines are headers.
    for line in content.lines().skip(2) {
        let Some((name, counters)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() || name == "lo" {
            continue;
        }

        let fields: Vec<&str> = counters.split_whitespace().collect();
        if fields.len() < 11 {
            continue;
        }
        let num = |idx: usize| -> u64 { fields[idx].parse().unwrap_or(0) };
        interfaces.push(NetDevCounters {
            name: name.to_string(),
            rx_bytes: num(0),
            rx_errs: num(2),
            tx_bytes: num(8),
            tx_errs: num(10),
        });
    }

    Ok(interfaces)
}

/// Parses `/proc/uptime` into centisecond ticks since boot.
pub fn parse_uptime_ticks(content: &str) -> Result<u64, ParseError> {
    let first = content
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::new("empty uptime"))?;

    let (secs, frac) = match first.split_once('.') {
        Some((s, f)) => (s, f),
        None => (first, "0"),
    };
    let secs: u64 = secs
        .parse()
        .map_err(|_| ParseError::new(format!("invalid uptime '{}'", first)))?;
    let centis: u64 = frac
        .chars()
        .chain(std::iter::repeat('0'))
        .take(2)
        .collect::<String>()
        .parse()
        .map_err(|_| ParseError::new(format!("invalid uptime fraction '{}'", first)))?;

    Ok(secs * 100 + centis)
}

/// Parses per-core "cpu MHz" lines from `/proc/cpuinfo`.
///
/// Returns an empty vector when the architecture does not report
/// frequencies there (arm, riscv); callers treat that as "unavailable".
pub fn parse_cpu_mhz(content: &str) -> Vec<u64> {
    content
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            if key.trim() != "cpu MHz" {
                return None;
            }
            value.trim().parse::<f64>().ok().map(|mhz| mhz as u64)
        })
        .collect()
}

/// One `/dev/`-backed mount from `/proc/mounts`.
#[derive(Debug, Clone, PartialEq)]
pub struct MountEntry {
    /// Source device path, e.g. `/dev/sda1`.
    pub device: String,
    pub mount_point: String,
}

/// Parses `/proc/mounts`, keeping only block-device-backed mounts.
pub fn parse_mounts(content: &str) -> Vec<MountEntry> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let mount_point = fields.next()?;
            if !device.starts_with("/dev/") {
                return None;
            }
            Some(MountEntry {
                device: device.to_string(),
                // Octal escapes (\040 for space) are rare in practice and
                // left as-is; device matching does not depend on them.
                mount_point: mount_point.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "\
cpu  10000 500 3000 80000 1000 200 100 50 0 0
cpu0 5000 250 1500 40000 500 100 50 25 0 0
cpu1 5000 250 1500 40000 500 100 50 25 0 0
intr 1000000 50 0
ctxt 500000
btime 1700000000
";

    #[test]
    fn stat_cpus_aggregate_then_cores() {
        let cpus = parse_stat_cpus(STAT).unwrap();
        assert_eq!(cpus.len(), 3);
        assert_eq!(cpus[0].cpu_id, None);
        assert_eq!(cpus[0].user, 10000);
        assert_eq!(cpus[0].steal, 50);
        assert_eq!(cpus[1].cpu_id, Some(0));
        assert_eq!(cpus[2].cpu_id, Some(1));
        assert_eq!(cpus[0].total(), 94850);
        assert_eq!(cpus[0].busy(), 94850 - 80000 - 1000);
    }

    #[test]
    fn stat_cpus_rejects_empty() {
        assert!(parse_stat_cpus("intr 5 0\n").is_err());
    }

    #[test]
    fn meminfo_fields_and_fallback() {
        let info = parse_meminfo(
            "MemTotal:       16384000 kB\nMemFree:         8192000 kB\nCached:  2048000 kB\nSwapTotal: 4096000 kB\nSwapFree: 4000000 kB\n",
        )
        .unwrap();
        assert_eq!(info.mem_total, 16384000);
        // No MemAvailable line: falls back to MemFree.
        assert_eq!(info.mem_available, 8192000);
        assert_eq!(info.swap_free, 4000000);

        assert!(parse_meminfo("SwapTotal: 1 kB\n").is_err());
    }

    #[test]
    fn diskstats_keeps_whole_devices_only() {
        let disks = parse_diskstats(
            "\
   8       0 sda 5000 100 800000 3000 2000 50 400000 1500 0 2500 4500
   8       1 sda1 4000 90 700000 2500 1800 40 350000 1200 0 2000 3700
 259       0 nvme0n1 9000 10 1600000 800 7000 5 1200000 900 0 1400 1700
 259       1 nvme0n1p1 100 0 2000 10 50 0 1000 5 0 15 15
   7       0 loop0 30 0 600 5 0 0 0 0 0 5 5
",
        )
        .unwrap();
        let names: Vec<&str> = disks.iter().map(|d| d.device.as_str()).collect();
        assert_eq!(names, vec!["sda", "nvme0n1"]);
        assert_eq!(disks[0].read_sectors, 800000);
        assert_eq!(disks[0].io_ms, 2500);
        assert_eq!(disks[1].write_sectors, 1200000);
    }

    #[test]
    fn partition_name_heuristic() {
        assert!(is_partition_name("sda1"));
        assert!(is_partition_name("xvda2"));
        assert!(is_partition_name("vdb3"));
        assert!(is_partition_name("nvme0n1p2"));
        assert!(is_partition_name("mmcblk0p1"));
        assert!(!is_partition_name("sda"));
        assert!(!is_partition_name("nvme0n1"));
        assert!(!is_partition_name("mmcblk0"));
        // Whole devices that end in a digit are not partitions.
        assert!(!is_partition_name("sr0"));
        assert!(!is_partition_name("fd0"));
        assert!(!is_partition_name("nbd0"));
        assert!(!is_partition_name("md0"));
    }

    #[test]
    fn diskstats_keeps_digit_suffixed_whole_devices() {
        let disks = parse_diskstats(
            "\
  11       0 sr0 120 0 960 40 0 0 0 0 0 35 35
   8       0 sda 5000 100 800000 3000 2000 50 400000 1500 0 2500 4500
   8       1 sda1 4000 90 700000 2500 1800 40 350000 1200 0 2000 3700
",
        )
        .unwrap();
        let names: Vec<&str> = disks.iter().map(|d| d.device.as_str()).collect();
        assert_eq!(names, vec!["sr0", "sda"]);
    }

    #[test]
    fn net_dev_skips_headers_and_loopback() {
        let ifaces = parse_net_dev(
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:  999999    1000    0    0    0     0          0         0   999999    1000    0    0    0     0       0          0
  eth0: 1000000    5000    2    0    0     0          0         0  2000000    4000    1    0    0     0       0          0
",
        )
        .unwrap();
        assert_eq!(ifaces.len(), 1);
        assert_eq!(ifaces[0].name, "eth0");
        assert_eq!(ifaces[0].rx_bytes, 1000000);
        assert_eq!(ifaces[0].rx_errs, 2);
        assert_eq!(ifaces[0].tx_bytes, 2000000);
        assert_eq!(ifaces[0].tx_errs, 1);
    }

    #[test]
    fn uptime_centisecond_ticks() {
        assert_eq!(parse_uptime_ticks("12345.67 98765.43\n").unwrap(), 1234567);
        assert_eq!(parse_uptime_ticks("0.5 1.0").unwrap(), 50);
        assert_eq!(parse_uptime_ticks("42 10").unwrap(), 4200);
        assert!(parse_uptime_ticks("").is_err());
        assert!(parse_uptime_ticks("abc def").is_err());
    }

    #[test]
    fn cpuinfo_mhz_lines() {
        let mhz = parse_cpu_mhz(
            "processor\t: 0\ncpu MHz\t\t: 2400.012\nprocessor\t: 1\ncpu MHz\t\t: 3100.500\n",
        );
        assert_eq!(mhz, vec![2400, 3100]);
        assert!(parse_cpu_mhz("processor: 0\nBogoMIPS: 48.00\n").is_empty());
    }

    #[test]
    fn mounts_keeps_dev_backed_only() {
        let mounts = parse_mounts(
            "\
/dev/nvme0n1p2 / ext4 rw,relatime 0 0
proc /proc proc rw 0 0
tmpfs /tmp tmpfs rw 0 0
/dev/sda1 /data xfs rw 0 0
",
        );
        assert_eq!(mounts.len(), 2);
        assert_eq!(mounts[0].device, "/dev/nvme0n1p2");
        assert_eq!(mounts[0].mount_point, "/");
        assert_eq!(mounts[1].mount_point, "/data");
    }
}
