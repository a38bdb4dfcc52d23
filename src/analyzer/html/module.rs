//! モジュール区切りコメントによる分割

use std::sync::LazyLock;

use regex::Regex;

use crate::model::ModuleName;

/// `<!-- --- [red-module:node-red/inject] --- -->`
static MODULE_DELIMITER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*-{3}\s*\[red-module:\s*([^\]]*?)\s*\]\s*-{3}\s*-->")
        .expect("Invalid module delimiter pattern")
});

/// 1モジュール分のHTML断片
#[derive(Clone, Debug, PartialEq)]
pub struct ModuleBlock<'a> {
    pub name: ModuleName,
    pub html: &'a str,
}

/// HTML全体をモジュールごとの断片に分割する
///
/// 最初の区切りより前の内容は捨てる。区切りの順序をそのまま保つ。
pub fn split_modules(html: &str) -> Vec<ModuleBlock<'_>> {
    let delimiters: Vec<_> = MODULE_DELIMITER.captures_iter(html).collect();
    let mut blocks = Vec::with_capacity(delimiters.len());

    for (i, caps) in delimiters.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = delimiters
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(html.len());

        blocks.push(ModuleBlock {
            name: parse_module_name(name.as_str()),
            html: &html[whole.end()..end],
        });
    }

    blocks
}

/// モジュール名をパッケージ名とセット名に分解する
///
/// - `@scope/pkg/set/sub` -> package `@scope/pkg`, set `set/sub`
/// - `node-red/inject` -> package `node-red`, set `inject`
/// - `pkg` -> package `pkg`, set なし
pub fn parse_module_name(name: &str) -> ModuleName {
    let segments: Vec<&str> = name.split('/').collect();

    let (package, rest) = if name.starts_with('@') && segments.len() >= 2 {
        (segments[..2].join("/"), &segments[2..])
    } else {
        (segments[0].to_string(), &segments[1..])
    };

    let set = rest.join("/");
    ModuleName {
        name: name.to_string(),
        package,
        set: (!set.is_empty()).then_some(set),
    }
}
