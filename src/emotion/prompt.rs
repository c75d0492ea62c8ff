use crate::model::Emotion;

/// Intensity scale for each emotion with an anchoring example, in the
/// language of the reviews being scored.
const EMOTION_DEFINITIONS: &str = "情感强度定义（0-1范围）：
Anger（愤怒）: 表达攻击性/不满的程度（如：垃圾游戏→0.95）
Disgust（厌恶）: 排斥/反感程度（如：恶心→0.9）
Anticipation（期待）: 对未来的期望值（如：等更新→0.8）
Fear（恐惧）: 担忧/害怕程度（如：封号风险→0.7）
Joy（快乐）: 积极愉悦程度（如：太好玩了→0.95）
Sadness（悲伤）: 失落/难过程度（如：好友退游→0.85）
Trust（信任）: 对产品/官方的认可度（如：官方良心→0.9）
Surprise（惊讶）: 意外感受程度（如：没想到这么好→0.75）";

const INSTRUCTION: &str = "请分析以下评论的八维度情感强度，返回包含各情感数值的JSON：";

/// Builds the classification prompt for one review.
///
/// The prompt carries the eight definitions, the JSON contract
/// `{sentiment, confidence, emotions: {...}}` with one key per emotion, and
/// the review text last.
pub fn build_prompt(text: &str) -> String {
    let emotion_keys = Emotion::ALL
        .iter()
        .map(|e| format!("    \"{}\": 0.0-1.0", e.name()))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "{definitions}\n\n{instruction}\n{{\n  \"sentiment\": \"positive/negative\",\n  \"confidence\": 0-1,\n  \"emotions\": {{\n{keys}\n  }}\n}}\n评论内容：{text}",
        definitions = EMOTION_DEFINITIONS,
        instruction = INSTRUCTION,
        keys = emotion_keys,
        text = text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_contract_and_text() {
        let prompt = build_prompt("太好玩了，强烈推荐");

        for emotion in Emotion::ALL {
            assert!(
                prompt.contains(&format!("\"{}\": 0.0-1.0", emotion.name())),
                "missing key for {}",
                emotion
            );
        }
        assert!(prompt.contains("\"sentiment\": \"positive/negative\""));
        assert!(prompt.contains("\"confidence\": 0-1"));
        assert!(prompt.contains("Anger（愤怒）"));
        assert!(prompt.ends_with("评论内容：太好玩了，强烈推荐"));
    }

    #[test]
    fn test_keys_follow_canonical_order() {
        let prompt = build_prompt("");
        let positions: Vec<usize> = Emotion::ALL
            .iter()
            .map(|e| prompt.find(&format!("\"{}\":", e.name())).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
