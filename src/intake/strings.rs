//! Localized prompt catalogue (English and Hindi).

use super::session::Language;

/// Every user-facing phrase the intake flow can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrase {
    Welcome,
    NameRequest,
    InvalidName,
    LoanTypeRequest,
    IncomeRequest,
    ObligationRequest,
    InvalidIncome,
    CreditScoreRequest,
    CreditScoreAdvisory,
    OffersGenerated,
    Rejection,
    SelectOffer,
    MobileRequest,
    InvalidMobile,
    KycStart,
    InvalidKycInput,
    KycInProgress,
    KycSuccess,
    KycFail,
    InvalidOtp,
    OtpSuccess,
    OtpFail,
    Locked,
    LanguageChanged,
    ButtonYes,
    ButtonRestart,
    ButtonPersonal,
    ButtonHome,
    ButtonBusiness,
    ButtonEducation,
    TierExcellent,
    TierGood,
    TierFair,
    TierPoor,
    TierUnknown,
}

fn english(phrase: Phrase) -> &'static str {
    match phrase {
        Phrase::Welcome => "Welcome to FinAI Bank. I am your advanced digital loan assistant. Before we begin, I must inform you that your data is securely processed according to banking regulations.",
        Phrase::NameRequest => "Excellent. May I have your full name as per your official documents?",
        Phrase::InvalidName => "Please enter a valid full name.",
        Phrase::LoanTypeRequest => "Hello {name}, what type of loan are you looking for today?",
        Phrase::IncomeRequest => "To customize your offer, what is your net monthly income? (e.g., 50000)",
        Phrase::ObligationRequest => "Do you have any existing monthly EMIs? If yes, please enter the total amount. If none, enter 0.",
        Phrase::InvalidIncome => "Please enter a valid monthly income (minimum 5000).",
        Phrase::CreditScoreRequest => "What is your approximate credit score? This helps us personalize your offer.",
        Phrase::CreditScoreAdvisory => "Noted. You may still be eligible, though interest rates might be slightly adjusted based on credit history.",
        Phrase::OffersGenerated => "Based on your income of {income} and eligibility score of {score}, I have generated these personalized offers for you:",
        Phrase::Rejection => "I'm sorry, but based on the provided financial details, we cannot offer you a loan at this time due to eligibility criteria.",
        Phrase::SelectOffer => "Please select one of the loan offers above to proceed.",
        Phrase::MobileRequest => "Great choice! To issue your sanction letter, we need to verify your identity. Please enter your Mobile Number to begin.",
        Phrase::InvalidMobile => "Please enter a valid 10-digit mobile number.",
        Phrase::KycStart => "Thank you. Initiating secure KYC verification protocol.\n\nPlease provide your PAN Number and upload your ID proof securely.",
        Phrase::InvalidKycInput => "Invalid Input. Ensure PAN is correct (e.g., ABCDE1234F) and Aadhaar is 12 digits.",
        Phrase::KycInProgress => "Your documents are being verified. Please wait.",
        Phrase::KycSuccess => "KYC Documents Verified Successfully. \n\nI have sent a One-Time Password (OTP) to your mobile number. Please enter '1234' to confirm.",
        Phrase::KycFail => "KYC Verification Failed. Your identity could not be verified automatically.",
        Phrase::InvalidOtp => "Please enter the 4-digit code.",
        Phrase::OtpSuccess => "Identity Verified Successfully! \n\nI am now generating your Provisional Sanction Letter.",
        Phrase::OtpFail => "Incorrect OTP. Please try again.",
        Phrase::Locked => "Maximum verification attempts exceeded. For security reasons, this session is now locked.",
        Phrase::LanguageChanged => "Language changed to English.",
        Phrase::ButtonYes => "Yes, Proceed",
        Phrase::ButtonRestart => "Restart Application",
        Phrase::ButtonPersonal => "Personal Loan",
        Phrase::ButtonHome => "Home Loan",
        Phrase::ButtonBusiness => "Business Loan",
        Phrase::ButtonEducation => "Education Loan",
        Phrase::TierExcellent => "Excellent (750+)",
        Phrase::TierGood => "Good (700-749)",
        Phrase::TierFair => "Fair (650-699)",
        Phrase::TierPoor => "Poor (<650)",
        Phrase::TierUnknown => "I don't know",
    }
}

/// Hindi catalogue. `None` falls back to English.
fn hindi(phrase: Phrase) -> Option<&'static str> {
    let text = match phrase {
        Phrase::Welcome => "FinAI बैंक में आपका स्वागत है। मैं आपका उन्नत डिजिटल ऋण सहायक हूं। शुरू करने से पहले, आपकी जानकारी बैंकिंग नियमों के अनुसार सुरक्षित रूप से संसाधित की जाएगी।",
        Phrase::NameRequest => "बहुत बढ़िया। क्या मैं आपका पूरा नाम जान सकता हूँ?",
        Phrase::LoanTypeRequest => "नमस्ते {name}, आज आप किस प्रकार का ऋण देख रहे हैं?",
        Phrase::IncomeRequest => "आपकी आय के आधार पर ऑफर बनाने के लिए, आपकी मासिक आय क्या है? (जैसे, 50000)",
        Phrase::ObligationRequest => "क्या आपकी कोई मौजूदा मासिक EMI है? यदि हाँ, तो कुल राशि दर्ज करें। यदि नहीं, तो 0 दर्ज करें।",
        Phrase::InvalidIncome => "कृपया एक वैध मासिक आय दर्ज करें (न्यूनतम 5000)।",
        Phrase::CreditScoreRequest => "आपका अनुमानित क्रेडिट स्कोर क्या है? यह हमें आपके ऑफ़र को व्यक्तिगत बनाने में मदद करता है।",
        Phrase::CreditScoreAdvisory => "नोट किया गया। आप अभी भी पात्र हो सकते हैं, हालांकि क्रेडिट इतिहास के आधार पर ब्याज दरों में थोड़ा समायोजन किया जा सकता है।",
        Phrase::OffersGenerated => "आपकी {income} की आय और {score} के पात्रता स्कोर के आधार पर, मैंने आपके लिए ये ऑफर तैयार किए हैं:",
        Phrase::Rejection => "मुझे खेद है, लेकिन प्रदान किए गए वित्तीय विवरणों के आधार पर, हम इस समय आपको ऋण प्रदान नहीं कर सकते।",
        Phrase::SelectOffer => "कृपया आगे बढ़ने के लिए ऊपर दिए गए ऋण प्रस्तावों में से एक का चयन करें।",
        Phrase::MobileRequest => "बेहतरीन चुनाव! अपना स्वीकृति पत्र जारी करने के लिए, हमें आपकी पहचान सत्यापित करनी होगी। कृपया अपना मोबाइल नंबर दर्ज करें।",
        Phrase::InvalidMobile => "कृपया एक मान्य 10-अंकीय मोबाइल नंबर दर्ज करें।",
        Phrase::KycStart => "धन्यवाद। सुरक्षित KYC सत्यापन शुरू किया जा रहा है।\n\nकृपया अपना पैन नंबर प्रदान करें और अपना आईडी प्रूफ सुरक्षित रूप से अपलोड करें।",
        Phrase::KycSuccess => "KYC दस्तावेज़ सफलतापूर्वक सत्यापित हुए। \n\nमैंने आपके मोबाइल नंबर पर एक वन-टाइम पासवर्ड (OTP) भेजा है। पुष्टि करने के लिए कृपया '1234' दर्ज करें।",
        Phrase::KycFail => "KYC सत्यापन विफल रहा। आपकी पहचान स्वचालित रूप से सत्यापित नहीं की जा सकी।",
        Phrase::OtpSuccess => "पहचान सफलतापूर्वक सत्यापित हुई! \n\nमैं अब आपका अनंतिम स्वीकृति पत्र (Sanction Letter) तैयार कर रहा हूँ।",
        Phrase::OtpFail => "गलत OTP। कृपया पुनः प्रयास करें।",
        Phrase::Locked => "अधिकतम सत्यापन प्रयास समाप्त हो गए। सुरक्षा कारणों से, यह सत्र अब लॉक कर दिया गया है।",
        Phrase::LanguageChanged => "भाषा हिंदी में बदल दी गई है।",
        Phrase::ButtonYes => "हाँ, आगे बढ़ें",
        Phrase::ButtonRestart => "पुनः आरंभ करें",
        Phrase::ButtonPersonal => "व्यक्तिगत ऋण",
        Phrase::ButtonHome => "गृह ऋण",
        Phrase::ButtonBusiness => "व्यापार ऋण",
        Phrase::ButtonEducation => "शिक्षा ऋण",
        Phrase::TierExcellent => "उत्कृष्ट (750+)",
        Phrase::TierGood => "अच्छा (700-749)",
        Phrase::TierFair => "निष्पक्ष (650-699)",
        Phrase::TierPoor => "खराब (<650)",
        Phrase::TierUnknown => "मुझे नहीं पता",
        Phrase::InvalidName
        | Phrase::InvalidKycInput
        | Phrase::KycInProgress
        | Phrase::InvalidOtp => return None,
    };
    Some(text)
}

/// Look up a phrase without interpolation.
pub fn phrase(language: Language, phrase: Phrase) -> &'static str {
    match language {
        Language::En => english(phrase),
        Language::Hi => hindi(phrase).unwrap_or_else(|| english(phrase)),
    }
}

/// Look up a phrase and substitute `{key}` placeholders.
pub fn render(language: Language, key: Phrase, params: &[(&str, &str)]) -> String {
    params
        .iter()
        .fold(phrase(language, key).to_string(), |acc, (name, value)| {
            acc.replace(&format!("{{{name}}}"), value)
        })
}

/// Button captions for a list of phrases.
pub fn buttons(language: Language, keys: &[Phrase]) -> Vec<String> {
    keys.iter()
        .map(|key| phrase(language, *key).to_string())
        .collect()
}

/// Format whole rupees with Indian digit grouping: `₹7,50,000`.
pub fn format_inr(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return format!("₹{digits}");
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("₹{},{tail}", groups.join(","))
}
