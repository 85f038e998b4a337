//! Pre-built mock host states for sampler tests.
//!
//! `typical_host()` is a small two-core machine with one disk and two
//! interfaces; `typical_host_later()` is the same machine ten seconds
//! later with all cumulative counters advanced by known deltas, so tests
//! can assert exact rates.

use super::MockFs;

impl MockFs {
    /// A typical host at time T (uptime 12345.00s).
    ///
    /// Known figures for assertions:
    /// - 2 cores at 2400/3100 MHz
    /// - sda with one mounted partition
    /// - eth0 (up, 1 Gbit link) and wlan0 (down, no speed file)
    /// - two thermal zones: x86_pkg_temp 45 C, acpitz 41 C
    pub fn typical_host() -> Self {
        let mut fs = Self::new();

        fs.add_file("/proc/uptime", "12345.00 98760.00\n");
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 5000 250 1500 40000 500 100 50 0 0 0
cpu1 5000 250 1500 40000 500 100 50 0 0 0
intr 1000000 50 0 0
ctxt 500000
btime 1700000000
procs_running 1
procs_blocked 0
",
        );
        fs.add_file(
            "/proc/cpuinfo",
            "\
processor\t: 0
model name\t: Mock CPU @ 2.40GHz
cpu MHz\t\t: 2400.000
processor\t: 1
model name\t: Mock CPU @ 2.40GHz
cpu MHz\t\t: 3100.000
",
        );
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
Dirty:              1024 kB
",
        );
        fs.add_file(
            "/proc/diskstats",
            "\
   8       0 sda 5000 100 800000 3000 2000 50 400000 1500 0 2500 4500
   8       1 sda1 4000 90 700000 2500 1800 40 350000 1200 0 2000 3700
   7       0 loop0 30 0 600 5 0 0 0 0 0 5 5
",
        );
        fs.add_file(
            "/proc/mounts",
            "\
/dev/sda1 / ext4 rw,relatime 0 0
proc /proc proc rw,nosuid 0 0
tmpfs /tmp tmpfs rw 0 0
",
        );
        fs.add_file(
            "/proc/net/dev",
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:  999999    1000    0    0    0     0          0         0   999999    1000    0    0    0     0       0          0
  eth0: 1000000    5000    2    0    0     0          0         0  2000000    4000    0    0    0     0       0          0
 wlan0:     500       5    0    0    0     0          0         0      600       6    0    0    0     0       0          0
",
        );

        fs.add_file("/sys/class/net/eth0/operstate", "up\n");
        fs.add_file("/sys/class/net/eth0/speed", "1000\n");
        fs.add_file("/sys/class/net/wlan0/operstate", "down\n");

        fs.add_file("/sys/class/thermal/thermal_zone0/type", "x86_pkg_temp\n");
        fs.add_file("/sys/class/thermal/thermal_zone0/temp", "45000\n");
        fs.add_file("/sys/class/thermal/thermal_zone1/type", "acpitz\n");
        fs.add_file("/sys/class/thermal/thermal_zone1/temp", "41000\n");

        fs
    }

    /// [`MockFs::typical_host`] ten seconds later (uptime 12355.00s).
    ///
    /// Counter deltas over the 10s window:
    /// - aggregate CPU: 400 busy / 2000 total jiffies = 20.0%
    ///   (cpu0 30.0%, cpu1 10.0%)
    /// - sda: +10,485,760 bytes read (1,048,576 B/s),
    ///   +1,048,576 bytes written (104,857.6 B/s), +1500 io_ms (15% busy)
    /// - eth0: +5,000,000 rx (500,000 B/s), +2,500,000 tx (250,000 B/s)
    /// - wlan0: unchanged
    pub fn typical_host_later() -> Self {
        let mut fs = Self::typical_host();

        fs.add_file("/proc/uptime", "12355.00 98770.00\n");
        fs.add_file(
            "/proc/stat",
            "\
cpu  10300 500 3100 81600 1000 200 100 0 0 0
cpu0 5250 250 1550 40700 500 100 50 0 0 0
cpu1 5050 250 1550 40900 500 100 50 0 0 0
intr 1001000 50 0 0
ctxt 502000
btime 1700000000
procs_running 1
procs_blocked 0
",
        );
        fs.add_file(
            "/proc/diskstats",
            "\
   8       0 sda 5100 120 820480 3100 2100 60 402048 1600 0 4000 6000
   8       1 sda1 4100 110 720480 2600 1900 50 352048 1300 0 3500 5200
   7       0 loop0 30 0 600 5 0 0 0 0 0 5 5
",
        );
        fs.add_file(
            "/proc/net/dev",
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 1099999    1100    0    0    0     0          0         0  1099999    1100    0    0    0     0       0          0
  eth0: 6000000    9000    2    0    0     0          0         0  4500000    8000    0    0    0     0       0          0
 wlan0:     500       5    0    0    0     0          0         0      600       6    0    0    0     0       0          0
",
        );

        fs
    }
}
