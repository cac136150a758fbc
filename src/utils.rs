/// 检查字符串是否包含任何给定的关键字
pub fn contains_any(s: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| s.contains(keyword))
}

/// 去掉输出两端的空白和换行
pub fn trim_output(s: &str) -> String {
    s.trim().to_string()
}

/// 按行切分并去掉行尾的回车
pub fn output_lines(s: &str) -> impl Iterator<Item = &str> {
    s.split('\n').map(|line| line.trim_end_matches('\r'))
}
