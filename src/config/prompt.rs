use crate::models::audit::WebsiteContext;

/// Fixed behavioral policy sent as the grounding system instruction. The
/// formatting rules here are what the session-side scrubber backs up: the
/// backend is told to never emit '#' or '*', and anything that slips through
/// is stripped before it reaches the transcript.
pub const SYSTEM_INSTRUCTION: &str = "\
You are TrafficTailor, a specialized AI copilot for website growth.
You act as a senior consultant.

STRICT FORMATTING RULE:
- NEVER use '#' or '*' symbols.
- Use CAPITALIZED TEXT for headings.
- Use plain numbers (1., 2., 3.) for lists.
- Use emojis for visual separation.
- Output must be clean plain text.

DYNAMIC RESPONSE LOGIC:
1. ADDRESS QUERY FIRST: If the user asks about a specific metric (e.g., LCP, CLS, Meta Traffic share), provide a deep-dive analysis of THAT specific data point immediately.
2. CONTEXTUAL AWARENESS: Use the provided Website Context (including platform like Shopify/WordPress and detailed social breakdowns for Meta, Google, TikTok, LinkedIn). Ground every claim in the specific figures provided.
3. PRO IMPLEMENTATION WARNING: For technical fixes (LCP, CLS, Mobile Viewport), always warn the user that these are code-level adjustments. State clearly that attempting these without expertise can break the site layout.
4. REVENUE OPTIMIZATION: When asked about revenue:
   - Provide a \"Full Growth Potential Audit\".
   - Break down: 1. Speed Impact, 2. Traffic Quality Gaps, 3. Conversion Friction.
   - Suggest 3 high-impact actions.
   - Advise the user to find a developer or connect with TrafficTailor for consultation.
5. FOLLOW-UPS: End every response with a section titled USEFUL THINGS YOU CAN ASK NEXT: listing up to 3 data-specific questions, then a section titled MORE GROWTH QUESTIONS: listing up to 3 broader questions. One question per line, each ending with a question mark.

AGENCY UPSELL:
Always frame technical fixes as tasks best handled by the TrafficTailor team. Suggest the \"Strategy Call\" for any complex roadmap.
";

/// System instruction plus the audit snapshot serialized as pretty JSON.
pub fn build_system_instruction(context: &WebsiteContext) -> String {
    let context_json = serde_json::to_string_pretty(context).unwrap_or_default();
    format!("{}\n\nWEBSITE CONTEXT:\n{}", SYSTEM_INSTRUCTION, context_json)
}

/// The two social channels with the largest shares, largest first.
fn top_social_channels(context: &WebsiteContext) -> [(&'static str, u32); 2] {
    let b = &context.traffic.social_breakdown;
    let mut channels = [
        ("Meta", b.meta),
        ("Google", b.google),
        ("LinkedIn", b.linkedin),
        ("TikTok", b.tiktok),
        ("Other", b.other),
    ];
    channels.sort_by(|a, b| b.1.cmp(&a.1));
    [channels[0], channels[1]]
}

/// Synthesizes the opening audit summary purely from the Context Model.
/// This text becomes the first transcript entry and is never sent to the
/// backend.
pub fn build_opening_message(context: &WebsiteContext) -> String {
    let lcp_sec = format!("{:.1}", context.metrics.lcp_ms / 1000.0);
    let cls = format!("{:.2}", context.metrics.cls);
    let bounce = context.traffic.social_quality.bounce_rate.round() as u32;
    let [(first_name, first_share), (second_name, second_share)] = top_social_channels(context);

    format!(
        "AUDIT COMPLETE: {url} ON {platform_upper}\n\
        \n\
        7-10 CRITICAL GROWTH POINTERS:\n\
        \n\
        1. PLATFORM: Detected {platform} architecture, high optimization potential.\n\
        2. CORE SPEED: {lcp_sec}s LCP is currently in the \"POOR\" zone, causing mobile drop-offs.\n\
        3. STABILITY: {cls} CLS indicates visual instability during checkout.\n\
        4. TRAFFIC LEAK: {bounce}% bounce rate from Meta/Social channels suggests audience mismatch.\n\
        5. CHANNEL DATA: {first_name} ({first_share}%) and {second_name} ({second_share}%) are your main drivers.\n\
        6. SEO GAP: {meta_tags} found in header scan.\n\
        7. MOBILITY: Touch target friction detected, potential 10% conversion lift on mobile fix.\n\
        8. INDEXING: Status is currently {indexability}; readiness confirmed for search scale.\n\
        9. REVENUE: Current {conversions} conversion baseline is below industry standard.\n\
        10. NEXT ACTION: Immediate technical P0 fixes required on LCP and {first_name}-traffic landing pages.\n\
        \n\
        ⚠️ PRO IMPLEMENTATION WARNING\n\
        Attempting to fix CLS layout shifts and Mobile Viewport issues without technical expertise can break your site's layout entirely. These are code-level adjustments, not simple plugin fixes.\n\
        \n\
        I strongly recommend letting the TrafficTailor team handle the technical heavy lifting.\n\
        \n\
        Suggested Next Step: Book a Strategy Call with us. We will map out exactly how to bring your performance metrics in line with industry leaders to turn that {bounce}% bounce rate into paying customers.\n\
        \n\
        Note: You should first find a developer or anyone you know of; if not, connect with us for a consultation.\n\
        \n\
        Where should we start the deep dive?",
        url = context.url,
        platform_upper = context.platform.to_string().to_uppercase(),
        platform = context.platform,
        lcp_sec = lcp_sec,
        cls = cls,
        bounce = bounce,
        first_name = first_name,
        first_share = first_share,
        second_name = second_name,
        second_share = second_share,
        meta_tags = context.seo.meta_tags,
        indexability = context.seo.indexability,
        conversions = context.traffic.social_quality.conversions
    )
}
