//! Prompt texts sent to the hosted models.
//!
//! The valuation instruction is the only place the reply schema is defined;
//! field names in it must stay in sync with [`crate::models::report`].

/// Instruction sent with every photo
pub const VALUATION_INSTRUCTION: &str = r#"你是一位严谨的生态经济学教授。请对这张照片进行 GEP 核算。

【任务一：透明化计算过程 (核心要求)】
1. 识别生态类型。
2. **必须引用谢高地(2015)标准**。
3. 展示公式：V = S × E × K。
   - **S (面积)**：假设图示区域为1公顷。
   - **E (当量因子)**：必须明确指出参考了谢高地表中的哪一列（如：因为是森林，选取了“森林”列的气体调节系数3.50）。
   - **K (修正系数)**：详细解释修正理由。例如：“K定为1.2，因为图中植被郁闭度极高，且位于亚热带，生物量高于平均水平”。
4. 列出具体的乘法算式。

【任务二：精准量化 (拒绝模糊)】
1. 健康度：根据植被覆盖和人为干扰，给出一个 0-100 的整数。
2. 固碳量：给出一个具体的估算数字（单位：吨/年），例如：15.5。

【任务三：深度后果推导 (利用机会成本法)】
如果开发成商业用地，请推导连锁反应。
格式要求：详细描述“起因 -> 过程 -> 结果”。例如：“地表硬化 -> 雨水下渗减少 -> 地表径流激增 -> 城市内涝风险增加”。

【任务四：详细专家建议】
给出详细的专家建议，每个建议包含是什么，为什么，怎么样。每个建议不少于500字。

请严格输出 JSON：
{
    "meta": {
        "ecosystem_name": "名称",
        "health_score": 85,
        "carbon": 120.5
    },
    "visual_evidence": ["线索1", "线索2"],
    "calculation_process": {
        "formula": "V = S × E × K",
        "param_explanation": {
            "S_explain": "面积取值理由...",
            "E_explain": "E值选取理由（对应谢高地表哪一项）...",
            "K_explain": "K值修正理由（基于图中什么特征）..."
        },
        "math_detail": "具体算式"
    },
    "total_value": 50000,
    "breakdown": {
        "供给服务": 5000,
        "调节服务": 25000,
        "文化服务": 10000,
        "支持服务": 10000
    },
    "simulation": {
        "scenario": "商业开发后果",
        "loss_value": 50000,
        "chain_of_consequence": "详细的推导链条（起因->过程->结果）"
    },
    "suggestions": [{"title": "建议1", "content": "内容"}, {"title": "建议2", "content": "内容"}]
}"#;

/// Stands in for the report context when no report has been generated
pub const NO_REPORT_MARKER: &str = "（暂无评估报告）";

/// Single-message prompt for a follow-up question
pub fn build_follow_up_prompt(question: &str, report_context: Option<&str>) -> String {
    format!(
        "用户提问：{}\n基于此报告：{}",
        question,
        report_context.unwrap_or(NO_REPORT_MARKER)
    )
}
