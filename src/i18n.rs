// String table for every label the presentation layer renders.
// Pure lookup: (key, language) -> &'static str.

use crate::language::Language;
use crate::logbook::Platform;
use crate::wallet::{Category, TransactionType};

/// Currency shown next to every amount
pub const CURRENCY: &str = "AED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Text {
    // Brand / header
    AppName,
    Location,
    Loading,

    // Navigation
    NavHome,
    NavMap,
    NavLogbook,
    NavWallet,
    NavSettings,

    // Home
    TodayDeliveries,
    TodayEarnings,
    TodayProfit,
    ReadyForAction,

    // Logbook
    LogbookTitle,
    RecordedMissions,
    SearchDeliveries,
    FilterAll,
    TotalEarnings,
    AddDelivery,
    AddNewDelivery,
    AddFirstDelivery,
    CustomerName,
    PlatformLabel,
    FeeLabel,
    AreaLabel,
    NotesLabel,
    NoDeliveries,

    // Wallet
    WalletTitle,
    WalletSubtitle,
    Income,
    Expenses,
    Profit,
    ProfitMargin,
    AddIncome,
    AddExpense,
    AmountLabel,
    CategoryLabel,
    DescriptionLabel,
    NoTransactions,
    Transactions,

    // Map
    MapTitle,
    ComingSoon,
    MapDescription,

    // Settings
    SettingsTitle,
    SettingsSubtitle,
    AppSettings,
    LanguageLabel,
    LanguageSubtitle,
    DarkMode,
    DarkModeSubtitle,
    Notifications,
    NotificationsSubtitle,
    DataManagement,
    ExportData,
    ExportDataSubtitle,
    ClearData,
    ClearDataSubtitle,
    DataProtection,
    StoredLocally,
    SavedDeliveries,
    TotalTransactions,
    On,
    Off,
    Tagline,

    // Forms
    Save,
    Cancel,

    // Status line
    DeliverySaved,
    TransactionSaved,
    RecordDeleted,
    DataExported,
    DataCleared,
    ConfirmClear,
    ErrorPrefix,
    DateLabel,

    // Key hints
    HintHome,
    HintMap,
    HintLogbook,
    HintWallet,
    HintSettings,
    HintSearch,
    HintForm,
}

/// Translated string for `text`
pub fn translate(text: Text, language: Language) -> &'static str {
    let (en, ar) = pair(text);
    match language {
        Language::En => en,
        Language::Ar => ar,
    }
}

fn pair(text: Text) -> (&'static str, &'static str) {
    match text {
        Text::AppName => ("Zimam Delivery", "زمام دليفري"),
        Text::Location => ("Dubai • UAE", "دبي • الإمارات"),
        Text::Loading => ("Loading Zimam Delivery...", "تحميل زمام دليفري..."),

        Text::NavHome => ("Home", "الرئيسية"),
        Text::NavMap => ("Map", "الخريطة"),
        Text::NavLogbook => ("Logbook", "سجل الرحلات"),
        Text::NavWallet => ("Wallet", "المحفظة"),
        Text::NavSettings => ("Settings", "الإعدادات"),

        Text::TodayDeliveries => ("Today's Deliveries", "طلبات اليوم"),
        Text::TodayEarnings => ("Today's Earnings", "أرباح اليوم"),
        Text::TodayProfit => ("Today's Profit", "ربح اليوم"),
        Text::ReadyForAction => ("Ready for Action!", "جاهز للإنجاز!"),

        Text::LogbookTitle => ("My Deliveries", "رحلاتي"),
        Text::RecordedMissions => ("recorded missions", "رحلة مسجلة"),
        Text::SearchDeliveries => ("Search deliveries...", "ابحث في الرحلات..."),
        Text::FilterAll => ("All", "الكل"),
        Text::TotalEarnings => ("Total Earnings", "إجمالي الأرباح"),
        Text::AddDelivery => ("Add Delivery", "إضافة رحلة"),
        Text::AddNewDelivery => ("Add New Delivery", "إضافة رحلة جديدة"),
        Text::AddFirstDelivery => ("Add First Delivery", "إضافة أول رحلة"),
        Text::CustomerName => ("Customer Name", "اسم العميل"),
        Text::PlatformLabel => ("Platform", "المنصة"),
        Text::FeeLabel => ("Fee (AED)", "الأجرة (درهم إماراتي)"),
        Text::AreaLabel => ("Area", "المنطقة"),
        Text::NotesLabel => ("Notes (Optional)", "ملاحظات (اختياري)"),
        Text::NoDeliveries => ("No deliveries yet", "لا توجد رحلات بعد"),

        Text::WalletTitle => ("Elite Wallet", "محفظة النخبة"),
        Text::WalletSubtitle => ("Track your golden empire", "تتبع أمجادك الذهبية"),
        Text::Income => ("Income", "الدخل"),
        Text::Expenses => ("Expenses", "المصاريف"),
        Text::Profit => ("Profit", "الربح"),
        Text::ProfitMargin => ("Profit Margin", "هامش الربح"),
        Text::AddIncome => ("Add Income", "إضافة دخل"),
        Text::AddExpense => ("Add Expense", "إضافة مصروف"),
        Text::AmountLabel => ("Amount (AED)", "المبلغ (درهم إماراتي)"),
        Text::CategoryLabel => ("Category", "الفئة"),
        Text::DescriptionLabel => ("Description", "الوصف"),
        Text::NoTransactions => ("No transactions today", "لا توجد معاملات اليوم"),
        Text::Transactions => ("transactions", "عملية"),

        Text::MapTitle => ("Address Map", "خريطة العناوين"),
        Text::ComingSoon => ("Coming Soon!", "قريباً جداً!"),
        Text::MapDescription => (
            "Save addresses, pin locations and plan routes.",
            "حفظ العناوين وتحديد المواقع وتخطيط المسارات.",
        ),

        Text::SettingsTitle => ("Settings", "الإعدادات"),
        Text::SettingsSubtitle => ("Customize your app", "تخصيص تطبيقك"),
        Text::AppSettings => ("App Settings", "إعدادات التطبيق"),
        Text::LanguageLabel => ("Language", "اللغة"),
        Text::LanguageSubtitle => ("Arabic / English", "العربية / الإنجليزية"),
        Text::DarkMode => ("Dark Mode", "الوضع المظلم"),
        Text::DarkModeSubtitle => ("Dark appearance for night", "مظهر داكن للمساء"),
        Text::Notifications => ("Notifications", "الإشعارات"),
        Text::NotificationsSubtitle => ("Order alerts and updates", "تنبيهات الطلبات والتحديثات"),
        Text::DataManagement => ("Data Management", "إدارة البيانات"),
        Text::ExportData => ("Export Data", "تصدير البيانات"),
        Text::ExportDataSubtitle => ("Backup your data", "حفظ نسخة احتياطية"),
        Text::ClearData => ("Clear Data", "مسح البيانات"),
        Text::ClearDataSubtitle => ("Delete all records", "حذف جميع السجلات"),
        Text::DataProtection => ("Data Protection", "حماية البيانات"),
        Text::StoredLocally => ("Your data is stored locally only", "بياناتك مخزنة محلياً فقط"),
        Text::SavedDeliveries => ("Saved deliveries", "عدد الطلبات المحفوظة"),
        Text::TotalTransactions => ("Total transactions", "إجمالي المعاملات"),
        Text::On => ("On", "مفعل"),
        Text::Off => ("Off", "معطل"),
        Text::Tagline => (
            "Designed specifically for Gulf delivery drivers",
            "مصمم خصيصاً لسائقي توصيل الخليج",
        ),

        Text::Save => ("Save", "حفظ"),
        Text::Cancel => ("Cancel", "إلغاء"),

        Text::DeliverySaved => ("Delivery saved", "تم حفظ الرحلة"),
        Text::TransactionSaved => ("Transaction saved", "تم حفظ المعاملة"),
        Text::RecordDeleted => ("Deleted", "تم الحذف"),
        Text::DataExported => ("Data exported to", "تم تصدير البيانات إلى"),
        Text::DataCleared => ("All data cleared", "تم مسح جميع البيانات"),
        Text::ConfirmClear => (
            "Delete all records? Press C again to confirm",
            "حذف جميع السجلات؟ اضغط C مرة أخرى للتأكيد",
        ),
        Text::ErrorPrefix => ("Error", "خطأ"),
        Text::DateLabel => ("Date", "التاريخ"),

        Text::HintHome => (
            "Tab: Switch page • a: Add delivery • q: Quit",
            "Tab: تبديل الصفحة • a: إضافة رحلة • q: خروج",
        ),
        Text::HintMap => ("Tab: Switch page • q: Quit", "Tab: تبديل الصفحة • q: خروج"),
        Text::HintLogbook => (
            "/: Search • p: Platform • a: Add • d: Delete • ↑↓: Select • q: Quit",
            "/: بحث • p: المنصة • a: إضافة • d: حذف • ↑↓: تحديد • q: خروج",
        ),
        Text::HintWallet => (
            "i: Add income • e: Add expense • d: Delete • ↑↓: Select • q: Quit",
            "i: إضافة دخل • e: إضافة مصروف • d: حذف • ↑↓: تحديد • q: خروج",
        ),
        Text::HintSettings => (
            "l: Language • m: Dark mode • n: Notifications • x: Export • C: Clear data",
            "l: اللغة • m: الوضع المظلم • n: الإشعارات • x: تصدير • C: مسح البيانات",
        ),
        Text::HintSearch => (
            "Type to search • Enter: Done • Esc: Clear",
            "اكتب للبحث • Enter: تم • Esc: مسح",
        ),
        Text::HintForm => (
            "Tab: Next field • ←/→: Change choice • Enter: Save • Esc: Cancel",
            "Tab: الحقل التالي • ←/→: تغيير الاختيار • Enter: حفظ • Esc: إلغاء",
        ),
    }
}

pub fn platform_name(platform: Platform, language: Language) -> &'static str {
    match (platform, language) {
        (Platform::Talabat, Language::En) => "Talabat",
        (Platform::Talabat, Language::Ar) => "طلبات",
        (Platform::Jahez, Language::En) => "Jahez",
        (Platform::Jahez, Language::Ar) => "جاهز",
        (Platform::Careem, Language::En) => "Careem",
        (Platform::Careem, Language::Ar) => "كريم",
        (Platform::Noon, Language::En) => "Noon",
        (Platform::Noon, Language::Ar) => "نون",
        (Platform::Other, Language::En) => "Other",
        (Platform::Other, Language::Ar) => "أخرى",
    }
}

pub fn category_name(category: Category, language: Language) -> &'static str {
    match (category, language) {
        (Category::Delivery, Language::En) => "Delivery",
        (Category::Delivery, Language::Ar) => "توصيل",
        (Category::Bonus, Language::En) => "Bonus",
        (Category::Bonus, Language::Ar) => "مكافأة",
        (Category::Tip, Language::En) => "Tip",
        (Category::Tip, Language::Ar) => "إكرامية",
        (Category::Fuel, Language::En) => "Fuel",
        (Category::Fuel, Language::Ar) => "وقود",
        (Category::Food, Language::En) => "Food",
        (Category::Food, Language::Ar) => "طعام",
        (Category::Maintenance, Language::En) => "Maintenance",
        (Category::Maintenance, Language::Ar) => "صيانة",
        (Category::Toll, Language::En) => "Toll",
        (Category::Toll, Language::Ar) => "رسوم سالك",
        (Category::Other, Language::En) => "Other",
        (Category::Other, Language::Ar) => "أخرى",
    }
}

pub fn transaction_type_name(kind: TransactionType, language: Language) -> &'static str {
    match kind {
        TransactionType::Income => translate(Text::Income, language),
        TransactionType::Expense => translate(Text::Expenses, language),
    }
}

/// "AED 1,234.50" style amount
pub fn format_amount(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative && cents > 0 { "-" } else { "" };
    if frac == 0 {
        format!("{} {}{}", CURRENCY, sign, grouped)
    } else {
        format!("{} {}{}.{:02}", CURRENCY, sign, grouped, frac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_switches_with_language() {
        assert_eq!(translate(Text::NavWallet, Language::En), "Wallet");
        assert_eq!(translate(Text::NavWallet, Language::Ar), "المحفظة");
    }

    #[test]
    fn test_platform_names() {
        assert_eq!(platform_name(Platform::Talabat, Language::En), "Talabat");
        assert_eq!(platform_name(Platform::Noon, Language::Ar), "نون");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(25.0), "AED 25");
        assert_eq!(format_amount(1234.5), "AED 1,234.50");
        assert_eq!(format_amount(-30.0), "AED -30");
        assert_eq!(format_amount(0.0), "AED 0");
        assert_eq!(format_amount(1_000_000.0), "AED 1,000,000");
    }
}
