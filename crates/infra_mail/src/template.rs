//! Invoice confirmation email

use serde::Deserialize;

use core_kernel::Money;

/// Company details printed in the email
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MailBranding {
    /// Short brand used in the subject line
    pub brand: String,
    pub company_name: String,
    pub legal_name: String,
    pub address_line: String,
    pub website_label: String,
    pub website_url: String,
    pub support_email: String,
    pub signature: String,
}

impl Default for MailBranding {
    fn default() -> Self {
        Self {
            brand: "OdishaTech".to_string(),
            company_name: "OdishaTech Software Solutions".to_string(),
            legal_name: "OdishaTech Software Solutions Private Limited".to_string(),
            address_line: "Infocity, Patia, Bhubaneswar, India".to_string(),
            website_label: "www.otss.com".to_string(),
            website_url: "https://otss.netlify.app".to_string(),
            support_email: "support@otss.com".to_string(),
            signature: "OTSS Billing Team".to_string(),
        }
    }
}

/// Values substituted into the template
#[derive(Debug, Clone)]
pub struct InvoiceMail<'a> {
    pub customer_name: &'a str,
    pub bill_id: &'a str,
    pub period: &'a str,
    pub amount: Money,
    pub year: i32,
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn subject(branding: &MailBranding, bill_id: &str, period: &str) -> String {
    format!("{} | Invoice Confirmation - {} ({})", branding.brand, bill_id, period)
}

pub fn render_html(branding: &MailBranding, mail: &InvoiceMail<'_>) -> String {
    let name = escape(mail.customer_name);
    let bill_id = escape(mail.bill_id);
    let period = escape(mail.period);
    let amount = escape(&mail.amount.to_string());

    format!(
        r#"<div style="font-family: 'Segoe UI', Arial, sans-serif; color: #2c3e50; padding: 20px; background: #f9f9f9;">
  <div style="max-width: 650px; margin: auto; background: #ffffff; border: 1px solid #e1e1e1; border-radius: 8px; padding: 30px;">
    <div style="border-bottom: 2px solid #004080; padding-bottom: 10px; margin-bottom: 20px;">
      <h2 style="color: #004080; margin: 0;">{company}</h2>
      <p style="font-size: 13px; margin: 2px 0; color: #555;">{address}</p>
      <p style="font-size: 13px; margin: 2px 0; color: #555;"><a href="{url}" style="color: #004080; text-decoration: none;">{site}</a></p>
    </div>
    <p style="font-size: 15px;">Dear <strong>{name}</strong>,</p>
    <p style="font-size: 15px; line-height: 1.6;">
      We acknowledge the receipt of your payment. Please find below the summary of your invoice for <strong>{period}</strong>.
      The detailed invoice is attached with this email for your records.
    </p>
    <table style="border-collapse: collapse; width: 100%; margin: 20px 0; font-size: 14px;">
      <tr><td style="padding: 10px; border: 1px solid #ddd; background: #f2f6fa;"><strong>Invoice ID</strong></td><td style="padding: 10px; border: 1px solid #ddd;">{bill_id}</td></tr>
      <tr><td style="padding: 10px; border: 1px solid #ddd; background: #f2f6fa;"><strong>Invoice Month</strong></td><td style="padding: 10px; border: 1px solid #ddd;">{period}</td></tr>
      <tr><td style="padding: 10px; border: 1px solid #ddd; background: #f2f6fa;"><strong>Total Amount</strong></td><td style="padding: 10px; border: 1px solid #ddd; font-weight: bold;">{amount}</td></tr>
    </table>
    <p style="margin-top: 20px; font-size: 14px; line-height: 1.6;">
      Should you have any queries, please reach out to our support team at
      <a href="mailto:{support}" style="color: #004080; text-decoration: none;">{support}</a>.
    </p>
    <p style="margin-top: 40px; font-size: 14px; color: #333;">Best Regards,<br><strong>{signature}</strong></p>
    <hr style="margin: 30px 0;">
    <p style="font-size: 11px; color: #777; line-height: 1.5;">
      This is an automated message from {company}. Please do not reply to this email.
      <br>&copy; {year} {legal}. All rights reserved.
    </p>
  </div>
</div>"#,
        company = escape(&branding.company_name),
        address = escape(&branding.address_line),
        url = escape(&branding.website_url),
        site = escape(&branding.website_label),
        support = escape(&branding.support_email),
        signature = escape(&branding.signature),
        legal = escape(&branding.legal_name),
        year = mail.year,
        name = name,
        period = period,
        bill_id = bill_id,
        amount = amount,
    )
}
