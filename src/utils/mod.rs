use std::time::Duration;

/// 将运行时长格式化为 `1d 2h 3m 4s`
pub fn format_uptime(uptime: Duration) -> String {
    let seconds = uptime.as_secs();
    let days = seconds / (3600 * 24);
    let hrs = (seconds % (3600 * 24)) / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    format!("{}d {}h {}m {}s", days, hrs, mins, secs)
}
