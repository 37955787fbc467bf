use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

/// Map a BCP 47 tag such as `navigator.language` to a supported locale.
pub fn parse_language_tag(raw: &str) -> Option<Locale> {
    let normalized = raw.trim().to_lowercase();
    let primary = normalized.split(['-', '_', '.', '@']).next()?.trim();
    match primary {
        "zh" => Some(Locale::Zh),
        "en" => Some(Locale::En),
        _ => None,
    }
}

pub fn panel_title(_locale: Locale) -> &'static str {
    "🎯 Pinpoint"
}

pub fn status_tracking(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Hover an element and click to comment",
        Locale::Zh => "悬停在元素上点击添加评论",
    }
}

pub fn status_paused(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Paused - the page works normally",
        Locale::Zh => "已暂停 - 可以正常操作页面",
    }
}

pub fn pause_tooltip(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Pause",
        Locale::Zh => "暂停",
    }
}

pub fn resume_tooltip(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Resume",
        Locale::Zh => "恢复",
    }
}

pub fn include_errors_label(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Include console errors",
        Locale::Zh => "包含控制台报错信息",
    }
}

pub fn empty_list(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "No comments yet",
        Locale::Zh => "暂无评论",
    }
}

pub fn no_comment(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "(no comment)",
        Locale::Zh => "(无评论)",
    }
}

pub fn clear_button(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Clear",
        Locale::Zh => "清空",
    }
}

pub fn finish_button(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "✓ Finish & copy",
        Locale::Zh => "✓ 完成并复制",
    }
}

pub fn dialog_title(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Add comment",
        Locale::Zh => "添加评论",
    }
}

pub fn dialog_element_label(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Element:",
        Locale::Zh => "元素:",
    }
}

pub fn dialog_location_label(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Location:",
        Locale::Zh => "位置:",
    }
}

pub fn dialog_placeholder(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Type your comment... (e.g. color too dark, misaligned)",
        Locale::Zh => "输入你的评论...（例如：颜色太深、对齐有问题等）",
    }
}

pub fn cancel_button(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Cancel",
        Locale::Zh => "取消",
    }
}

pub fn save_button(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Save",
        Locale::Zh => "保存",
    }
}

pub fn notify_started(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "🎯 Pinpoint started",
        Locale::Zh => "🎯 Pinpoint 已启动",
    }
}

pub fn notify_paused(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "⏸ Paused, the page works normally",
        Locale::Zh => "⏸ 已暂停，可以正常操作页面",
    }
}

pub fn notify_resumed(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "▶ Resumed",
        Locale::Zh => "▶ 已恢复",
    }
}

pub fn notify_copied(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "✅ Copied to clipboard!",
        Locale::Zh => "✅ 已复制到剪贴板！",
    }
}
